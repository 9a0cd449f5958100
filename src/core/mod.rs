pub mod beat;
pub mod catalog;
pub mod filter;
pub mod grammar;
pub mod markdown;
pub mod matchup;
pub mod pipeline;
pub mod structure;
