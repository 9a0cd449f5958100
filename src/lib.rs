//! Rap Battle Bot: slash-command handlers for a rap battle community.
//!
//! Three commands run over read-only catalogs loaded at startup: `/beat`
//! filters the beat catalog, `/matchup` casts community members as
//! fictional characters, and `/structure` lays out verse lengths for a
//! two-person battle. Handlers are pure functions of their options, the
//! catalogs and an RNG; [`crate::core::pipeline::Bot`] wires them to invocations.

pub mod core;
pub mod schema;
