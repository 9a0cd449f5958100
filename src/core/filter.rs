/// Track filter pipeline: matching mode, tempo and tag filters, then selection.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use thiserror::Error;

use crate::schema::command::BeatOptions;
use crate::schema::track::{TagField, Track};

/// Most beats a single reply may show.
pub const MAX_BEATS: usize = 10;

/// Slack applied to tempo comparisons.
const BPM_TOLERANCE: f64 = 0.01;
/// Lowest fuzzy score still returned: up to 60% of the pattern may be edits.
const MIN_FUZZY_SCORE: f64 = 0.4;
/// Fuzzy patterns are cut to this many characters.
const MAX_PATTERN_LENGTH: usize = 32;

/// User-facing problems with a `/beat` query. The display text is sent back
/// to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Invalid BPM argument \"{0}\"")]
    InvalidBpm(String),
    #[error("Invalid number of beats: {0}")]
    InvalidCount(i64),
    #[error("{found} beats found, but I can only display {cap} at once.")]
    TooMany { found: usize, cap: usize },
}

/// How the starting set is drawn from the catalog.
///
/// At most one mode applies. When several name/url options are supplied the
/// first in the order exact-name, name-contains, fuzzy name, url wins.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionMode {
    ExactName(String),
    NameContains(String),
    Fuzzy(String),
    UrlContains(String),
    All,
}

impl SelectionMode {
    pub fn resolve(opts: &BeatOptions) -> SelectionMode {
        if let Some(name) = &opts.exact_name {
            SelectionMode::ExactName(name.to_lowercase())
        } else if let Some(fragment) = &opts.name_contains {
            SelectionMode::NameContains(fragment.to_lowercase())
        } else if let Some(pattern) = &opts.fuzzy_name {
            SelectionMode::Fuzzy(pattern.to_lowercase().chars().take(MAX_PATTERN_LENGTH).collect())
        } else if let Some(fragment) = &opts.url {
            SelectionMode::UrlContains(fragment.to_lowercase())
        } else {
            SelectionMode::All
        }
    }

    /// Ranked results keep their order and are never sampled at random.
    pub fn is_ranked(&self) -> bool {
        matches!(self, SelectionMode::Fuzzy(_))
    }

    fn apply<'t>(&self, tracks: &'t [Track]) -> Vec<&'t Track> {
        match self {
            SelectionMode::ExactName(name) => tracks
                .iter()
                .filter(|t| t.name.to_lowercase() == *name)
                .collect(),
            SelectionMode::NameContains(fragment) => tracks
                .iter()
                .filter(|t| t.name.to_lowercase().contains(fragment.as_str()))
                .collect(),
            SelectionMode::Fuzzy(pattern) => fuzzy_search(tracks, pattern),
            SelectionMode::UrlContains(fragment) => tracks
                .iter()
                .filter(|t| t.file_url.to_lowercase().contains(fragment.as_str()))
                .collect(),
            SelectionMode::All => tracks.iter().collect(),
        }
    }
}

/// Fewest single-character edits that turn `pattern` into some substring
/// of `text`.
///
/// Levenshtein with a free start and end in `text`, so the pattern may align
/// anywhere, including inside a word.
fn substring_distance(pattern: &[char], text: &[char]) -> usize {
    let mut prev = vec![0; text.len() + 1];
    let mut cur = vec![0; text.len() + 1];
    for (i, &p) in pattern.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &t) in text.iter().enumerate() {
            let substitute = prev[j] + usize::from(p != t);
            cur[j + 1] = substitute.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev.into_iter().min().unwrap_or(pattern.len())
}

/// How well `pattern` (already lowercased) occurs in a track name, in
/// `0.0..=1.0`: one minus the share of the pattern that needs editing.
/// A name containing the pattern verbatim scores 1.
pub fn fuzzy_score(pattern: &str, name: &str) -> f64 {
    let pattern: Vec<char> = pattern.chars().collect();
    if pattern.is_empty() {
        return 1.0;
    }
    let name: Vec<char> = name.to_lowercase().chars().collect();
    let errors = substring_distance(&pattern, &name);
    1.0 - errors as f64 / pattern.len() as f64
}

fn fuzzy_search<'t>(tracks: &'t [Track], pattern: &str) -> Vec<&'t Track> {
    let mut scored: Vec<(f64, f64, &Track)> = tracks
        .iter()
        .map(|t| (fuzzy_score(pattern, &t.name), t))
        .filter(|(score, _)| *score >= MIN_FUZZY_SCORE)
        .map(|(score, t)| (score, strsim::jaro_winkler(pattern, &t.name.to_lowercase()), t))
        .collect();
    // Ties go to the name closest overall; the sort is stable, so full ties
    // keep catalog order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.total_cmp(&a.1)));
    scored.into_iter().map(|(_, _, t)| t).collect()
}

/// A tempo constraint parsed from the `bpm` option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BpmFilter {
    Exact(f64),
    Range { min: f64, max: f64 },
}

impl BpmFilter {
    /// Parses `"90"` or `"80-90"`; the bounds of a range may come in either order.
    pub fn parse(input: &str) -> Result<BpmFilter, FilterError> {
        let invalid = || FilterError::InvalidBpm(input.to_string());
        let numbers = input
            .split('-')
            .map(|part| {
                let part = part.trim();
                match part.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(n),
                    _ => Err(invalid()),
                }
            })
            .collect::<Result<Vec<f64>, FilterError>>()?;

        match numbers.as_slice() {
            [bpm] => Ok(BpmFilter::Exact(*bpm)),
            [a, b] => Ok(BpmFilter::Range {
                min: a.min(*b),
                max: a.max(*b),
            }),
            _ => Err(invalid()),
        }
    }

    /// Beats without a recorded tempo never match.
    pub fn matches(&self, track: &Track) -> bool {
        let Some(bpm) = track.tempo() else {
            return false;
        };
        match *self {
            BpmFilter::Exact(target) => (bpm - target).abs() < BPM_TOLERANCE,
            BpmFilter::Range { min, max } => bpm > min - BPM_TOLERANCE && bpm < max + BPM_TOLERANCE,
        }
    }
}

/// Lowercased, trimmed keys of a comma-separated option. A blank key matches
/// any tag, so it only asks for the tag list to be non-empty.
fn parse_keys(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|key| key.trim().to_lowercase())
        .collect()
}

/// True if any tag in `field` contains any of `keys` (case-insensitive).
fn matches_any_key(track: &Track, field: TagField, keys: &[String]) -> bool {
    let Some(tags) = track.tags(field) else {
        return false;
    };
    tags.iter().any(|tag| {
        let tag = tag.to_lowercase();
        keys.iter().any(|key| tag.contains(key.as_str()))
    })
}

/// A fully parsed `/beat` query, ready to run against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatQuery {
    pub mode: SelectionMode,
    pub bpm: Option<BpmFilter>,
    pub tag_filters: Vec<(TagField, Vec<String>)>,
    pub purchasable_only: bool,
}

impl BeatQuery {
    pub fn from_options(opts: &BeatOptions) -> Result<BeatQuery, FilterError> {
        let bpm = opts.bpm.as_deref().map(BpmFilter::parse).transpose()?;

        let mut tag_filters = Vec::new();
        for (field, input) in [
            (TagField::Producers, &opts.producers),
            (TagField::Genres, &opts.genres),
            (TagField::Moods, &opts.moods),
        ] {
            if let Some(input) = input {
                tag_filters.push((field, parse_keys(input)));
            }
        }

        Ok(BeatQuery {
            mode: SelectionMode::resolve(opts),
            bpm,
            tag_filters,
            purchasable_only: opts.purchasable,
        })
    }

    /// Runs every filter in turn, each narrowing the previous result.
    pub fn filter<'t>(&self, tracks: &'t [Track]) -> Vec<&'t Track> {
        let mut matching = self.mode.apply(tracks);

        if let Some(bpm) = &self.bpm {
            matching.retain(|t| bpm.matches(t));
        }
        for (field, keys) in &self.tag_filters {
            matching.retain(|t| matches_any_key(t, *field, keys));
        }
        if self.purchasable_only {
            matching.retain(|t| t.is_purchasable());
        }
        matching
    }
}

/// How many of the filtered beats to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Every,
    Count(i64),
    One,
}

impl Selection {
    pub fn from_options(opts: &BeatOptions) -> Selection {
        if opts.every {
            Selection::Every
        } else if let Some(num) = opts.num {
            Selection::Count(num)
        } else {
            Selection::One
        }
    }
}

/// Picks beats out of a non-empty filtered set.
///
/// Ranked sets yield their leading entries; unranked sets are sampled
/// uniformly without replacement.
pub fn select<'t, R: Rng + ?Sized>(
    matching: &[&'t Track],
    selection: Selection,
    ranked: bool,
    rng: &mut R,
) -> Result<Vec<&'t Track>, FilterError> {
    let picked = match selection {
        Selection::Every => matching.to_vec(),
        Selection::Count(num) if num < 1 => return Err(FilterError::InvalidCount(num)),
        Selection::Count(num) => {
            let wanted = usize::try_from(num).unwrap_or(usize::MAX);
            if ranked {
                matching.iter().take(wanted).copied().collect()
            } else {
                let amount = wanted.min(matching.len());
                index::sample(rng, matching.len(), amount)
                    .into_iter()
                    .map(|i| matching[i])
                    .collect()
            }
        }
        Selection::One => {
            let one = if ranked {
                matching.first()
            } else {
                matching.choose(rng)
            };
            one.copied().into_iter().collect()
        }
    };
    Ok(picked)
}

/// Outcome of a `/beat` lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum BeatLookup<'t> {
    NoMatches,
    Found(Vec<&'t Track>),
}

/// Filter the catalog, select from the matches and enforce the display cap.
pub fn find_beats<'t, R: Rng + ?Sized>(
    tracks: &'t [Track],
    opts: &BeatOptions,
    cap: usize,
    rng: &mut R,
) -> Result<BeatLookup<'t>, FilterError> {
    let query = BeatQuery::from_options(opts)?;
    let matching = query.filter(tracks);
    if matching.is_empty() {
        return Ok(BeatLookup::NoMatches);
    }

    let picked = select(&matching, Selection::from_options(opts), query.mode.is_ranked(), rng)?;
    if picked.len() > cap {
        return Err(FilterError::TooMany {
            found: picked.len(),
            cap,
        });
    }
    Ok(BeatLookup::Found(picked))
}
