/// Catalog loading for the read-only data files the commands run on.

use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::schema::character::{Character, Roster};
use crate::schema::track::Track;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("RON deserialization error in {path}: {source}")]
    Ron {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("JSON deserialization error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported catalog format: {0} (expected .ron or .json)")]
    UnsupportedFormat(String),
}

/// Load any catalog file, picking the format from the extension.
pub fn load_catalog<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let display = path.display().to_string();
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
    if extension != "ron" && extension != "json" {
        return Err(CatalogError::UnsupportedFormat(display));
    }

    let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: display.clone(),
        source,
    })?;

    if extension == "ron" {
        ron::from_str(&contents).map_err(|source| CatalogError::Ron { path: display, source })
    } else {
        serde_json::from_str(&contents).map_err(|source| CatalogError::Json { path: display, source })
    }
}

pub fn load_tracks(path: &Path) -> Result<Vec<Track>, CatalogError> {
    let tracks: Vec<Track> = load_catalog(path)?;
    info!("Loaded {} beats from {}", tracks.len(), path.display());
    Ok(tracks)
}

pub fn load_characters(path: &Path) -> Result<Vec<Character>, CatalogError> {
    let characters: Vec<Character> = load_catalog(path)?;
    info!("Loaded {} characters from {}", characters.len(), path.display());
    Ok(characters)
}

pub fn load_roster(path: &Path) -> Result<Roster, CatalogError> {
    let roster: Roster = load_catalog(path)?;
    info!("Loaded {} roster members from {}", roster.len(), path.display());
    Ok(roster)
}

/// A data-quality finding from [`check_tracks`] or [`check_characters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// The entry cannot be served properly.
    Error(String),
    /// The entry works but is probably not what the curator meant.
    Warning(String),
}

impl Problem {
    pub fn is_error(&self) -> bool {
        matches!(self, Problem::Error(_))
    }
}

/// Check the track catalog for entries that would render badly.
pub fn check_tracks(tracks: &[Track]) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut seen = rustc_hash::FxHashSet::default();

    for (i, track) in tracks.iter().enumerate() {
        let label = if track.name.trim().is_empty() {
            problems.push(Problem::Error(format!("Beat #{} has an empty name", i)));
            format!("#{}", i)
        } else {
            format!("'{}'", track.name)
        };

        if track.file_url.trim().is_empty() {
            problems.push(Problem::Error(format!("Beat {} has no audio file URL", label)));
        }
        if track.page_url.trim().is_empty() {
            problems.push(Problem::Error(format!("Beat {} has no beat page URL", label)));
        }
        if track.producers.as_ref().map_or(true, |p| p.is_empty()) {
            problems.push(Problem::Warning(format!("Beat {} has no producers", label)));
        }
        match track.bpm {
            None => problems.push(Problem::Warning(format!("Beat {} has no BPM", label))),
            Some(bpm) if !(bpm.is_finite() && bpm > 0.0) => {
                problems.push(Problem::Error(format!("Beat {} has an invalid BPM {}", label, bpm)))
            }
            Some(_) => {}
        }
        if !seen.insert(track.name.to_lowercase()) {
            problems.push(Problem::Warning(format!("Beat name {} appears more than once", label)));
        }
    }
    problems
}

pub fn check_characters(characters: &[Character]) -> Vec<Problem> {
    let mut problems = Vec::new();
    if characters.is_empty() {
        problems.push(Problem::Error("Character catalog is empty".to_string()));
    }
    for (i, character) in characters.iter().enumerate() {
        if character.label.trim().is_empty() {
            problems.push(Problem::Error(format!("Character #{} has an empty label", i)));
        }
        if character.article.trim().is_empty() {
            problems.push(Problem::Warning(format!(
                "Character '{}' has no article URL",
                character.label
            )));
        }
    }
    problems
}

pub fn check_roster(roster: &Roster) -> Vec<Problem> {
    let mut problems = Vec::new();
    if roster.len() < 2 {
        problems.push(Problem::Error(format!(
            "Roster has {} members, matchups need at least 2",
            roster.len()
        )));
    }
    let mut seen = rustc_hash::FxHashSet::default();
    for member in roster.members() {
        if !seen.insert(member.as_str()) {
            problems.push(Problem::Warning(format!("Roster lists '{}' more than once", member)));
        }
    }
    problems
}

/// Log every problem; returns how many were errors.
pub fn report_problems(source: &str, problems: &[Problem]) -> usize {
    let mut errors = 0;
    for problem in problems {
        match problem {
            Problem::Error(msg) => {
                errors += 1;
                warn!("{}: {}", source, msg);
            }
            Problem::Warning(msg) => info!("{}: {}", source, msg),
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn load_ron_and_json_fixtures() {
        let ron_tracks = load_tracks(&PathBuf::from("tests/fixtures/test_beats.ron")).unwrap();
        assert_eq!(ron_tracks.len(), 4);
        assert_eq!(ron_tracks[0].name, "Night Drive");

        let json_tracks = load_tracks(&PathBuf::from("tests/fixtures/test_beats.json")).unwrap();
        assert_eq!(json_tracks.len(), 2);
        assert_eq!(json_tracks[1].available_for_purchase, Some(false));
    }

    #[test]
    fn load_unsupported_extension() {
        let err = load_tracks(&PathBuf::from("tests/fixtures/beats.csv")).unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedFormat(_)));
    }

    #[test]
    fn load_missing_file() {
        let err = load_roster(&PathBuf::from("tests/fixtures/no_such_roster.ron")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(err.to_string().contains("no_such_roster.ron"));
    }

    #[test]
    fn load_malformed_file() {
        let err = load_characters(&PathBuf::from("tests/fixtures/broken_characters.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Json { .. }));
    }

    #[test]
    fn check_tracks_flags_problems() {
        let good = Track {
            name: "Night Drive".to_string(),
            producers: Some(vec!["Aqua".to_string()]),
            genres: None,
            moods: None,
            bpm: Some(128.0),
            file_url: "https://beats.example.com/a.mp3".to_string(),
            page_url: "https://beats.example.com/a".to_string(),
            available_for_purchase: None,
        };
        assert!(check_tracks(std::slice::from_ref(&good)).is_empty());

        let mut dup = good.clone();
        dup.name = "NIGHT DRIVE".to_string();
        dup.bpm = None;
        let mut broken = good.clone();
        broken.file_url = String::new();
        broken.bpm = Some(-5.0);

        let problems = check_tracks(&[good, dup, broken]);
        let errors: Vec<&Problem> = problems.iter().filter(|p| p.is_error()).collect();
        assert_eq!(errors.len(), 2);
        assert!(problems.contains(&Problem::Warning("Beat 'NIGHT DRIVE' has no BPM".to_string())));
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::Warning(m) if m.contains("more than once"))));
    }

    #[test]
    fn check_roster_and_characters() {
        let problems = check_roster(&Roster(vec!["Ace".to_string()]));
        assert!(problems[0].is_error());

        let problems = check_roster(&Roster(vec!["Ace".to_string(), "Ace".to_string()]));
        assert_eq!(problems.len(), 1);
        assert!(!problems[0].is_error());

        assert!(check_characters(&[])[0].is_error());
        assert_eq!(report_problems("test", &check_characters(&[])), 1);
    }
}
