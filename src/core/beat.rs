/// The `/beat` command: catalog lookup rendered as beat cards.

use rand::Rng;
use tracing::debug;

use crate::core::filter::{find_beats, BeatLookup};
use crate::core::markdown::{escape_markdown, link};
use crate::schema::command::BeatOptions;
use crate::schema::reply::{Card, Reply};
use crate::schema::track::Track;

pub const NO_MATCHES: &str = "No matching beats found.";
const UNKNOWN_PRODUCER: &str = "???";
const SOLD_NOTICE: &str = "This beat has been purchased. It may be unmonetizable.";
const WARNING_ICON: &str = "https://cdnjs.cloudflare.com/ajax/libs/twemoji/2.2.5/36x36/26a0.png";

/// Run a `/beat` lookup. Validation problems come back as text replies.
pub fn beat<R: Rng + ?Sized>(tracks: &[Track], opts: &BeatOptions, cap: usize, rng: &mut R) -> Reply {
    match find_beats(tracks, opts, cap, rng) {
        Ok(BeatLookup::NoMatches) => Reply::text(NO_MATCHES),
        Ok(BeatLookup::Found(found)) => {
            debug!(count = found.len(), "beats selected");
            Reply::Cards(found.into_iter().map(render_track).collect())
        }
        Err(e) => Reply::text(e.to_string()),
    }
}

pub fn render_track(track: &Track) -> Card {
    let producers = match &track.producers {
        Some(producers) => producers.join(", "),
        None => UNKNOWN_PRODUCER.to_string(),
    };
    let mut card = Card::new(format!(
        "**{}** by **{}**",
        escape_markdown(&track.name),
        escape_markdown(&producers)
    ))
    .field("Audio file", link("Listen", &track.file_url), true)
    .field("Beat page", link("Visit", &track.page_url), true);

    if let Some(bpm) = track.tempo() {
        card = card.field("BPM", bpm.to_string(), false);
    }
    if let Some(genres) = track.genres.as_ref().filter(|g| !g.is_empty()) {
        card = card.field("Genres", genres.join(", "), true);
    }
    if let Some(moods) = track.moods.as_ref().filter(|m| !m.is_empty()) {
        card = card.field("Moods", moods.join(", "), true);
    }
    if !track.is_purchasable() {
        card = card.footer(SOLD_NOTICE, Some(WARNING_ICON));
    }
    card
}
