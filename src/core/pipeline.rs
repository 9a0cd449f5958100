/// The bot: per-command data loading and invocation dispatch.
///
/// Each command loads its catalogs once, up front. A command whose data
/// fails to load is left out; the others still serve.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::core::beat::beat;
use crate::core::catalog::{self, CatalogError};
use crate::core::filter::MAX_BEATS;
use crate::core::grammar::{GrammarError, GrammarSet};
use crate::core::matchup::{self, MatchupError};
use crate::core::structure::{structure, StructureError};
use crate::schema::character::{Character, Roster};
use crate::schema::command::{BeatOptions, CommandSchema, Invocation, StructureOptions};
use crate::schema::reply::Reply;
use crate::schema::track::Track;

/// Sent when a command fails for reasons the user cannot fix.
pub const INTERNAL_ERROR_REPLY: &str = "Something went wrong there, sorry!";

#[derive(Debug, Error)]
pub enum BotError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("matchup error: {0}")]
    Matchup(#[from] MatchupError),
    #[error("structure error: {0}")]
    Structure(#[from] StructureError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// The slash commands the bot knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandName {
    Beat,
    Matchup,
    Structure,
}

impl CommandName {
    pub const ALL: [CommandName; 3] = [CommandName::Beat, CommandName::Matchup, CommandName::Structure];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Beat => "beat",
            Self::Matchup => "matchup",
            Self::Structure => "structure",
        }
    }

    pub fn parse(name: &str) -> Option<CommandName> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn schema(&self) -> CommandSchema {
        match self {
            Self::Beat => CommandSchema::beat(),
            Self::Matchup => CommandSchema::matchup(),
            Self::Structure => CommandSchema::structure(),
        }
    }
}

/// Where the bot finds its data and how it behaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Directory holding `beats`, `characters`, `community_members` and
    /// `series` data files.
    pub data_dir: PathBuf,
    pub tracks: Option<PathBuf>,
    pub characters: Option<PathBuf>,
    pub roster: Option<PathBuf>,
    pub series: Option<PathBuf>,
    /// Fixed seed for reproducible replies; entropy when absent.
    pub seed: Option<u64>,
    pub max_beats: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tracks: None,
            characters: None,
            roster: None,
            series: None,
            seed: None,
            max_beats: MAX_BEATS,
        }
    }
}

impl BotConfig {
    /// Load a config from a RON file. Missing fields take their defaults.
    pub fn load_from_ron(path: &Path) -> Result<BotConfig, BotError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&contents)?)
    }

    pub fn tracks_path(&self) -> PathBuf {
        self.tracks
            .clone()
            .unwrap_or_else(|| data_file(&self.data_dir, "beats"))
    }

    pub fn characters_path(&self) -> PathBuf {
        self.characters
            .clone()
            .unwrap_or_else(|| data_file(&self.data_dir, "characters"))
    }

    pub fn roster_path(&self) -> PathBuf {
        self.roster
            .clone()
            .unwrap_or_else(|| data_file(&self.data_dir, "community_members"))
    }
}

/// `<dir>/<stem>.ron`, or the `.json` export when only that exists.
fn data_file(dir: &Path, stem: &str) -> PathBuf {
    let ron = dir.join(format!("{}.ron", stem));
    let json = dir.join(format!("{}.json", stem));
    if !ron.exists() && json.exists() {
        json
    } else {
        ron
    }
}

struct BeatData {
    tracks: Vec<Track>,
}

struct MatchupData {
    characters: Vec<Character>,
    roster: Roster,
    series: GrammarSet,
}

/// The running bot. Catalogs are immutable after `build()`, so a `Bot` can
/// be shared across threads and dispatched from concurrently.
pub struct Bot {
    beat: Option<BeatData>,
    matchup: Option<MatchupData>,
    max_beats: usize,
    seed: Option<u64>,
    invocation_count: AtomicU64,
}

/// Builder for constructing a `Bot`.
pub struct BotBuilder {
    config: BotConfig,
    /// Directly provided tracks (for testing without files).
    tracks: Option<Vec<Track>>,
    /// Directly provided characters (for testing without files).
    characters: Option<Vec<Character>>,
    /// Directly provided roster (for testing without files).
    roster: Option<Roster>,
    /// Directly provided series grammar (for testing without files).
    series: Option<GrammarSet>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder {
            config: BotConfig::default(),
            tracks: None,
            characters: None,
            roster: None,
            series: None,
        }
    }

    /// Commands whose data loaded, in registration order.
    pub fn available_commands(&self) -> Vec<CommandName> {
        CommandName::ALL
            .into_iter()
            .filter(|c| self.is_available(*c))
            .collect()
    }

    pub fn is_available(&self, command: CommandName) -> bool {
        match command {
            CommandName::Beat => self.beat.is_some(),
            CommandName::Matchup => self.matchup.is_some(),
            CommandName::Structure => true,
        }
    }

    /// Registration payloads for every available command.
    pub fn schemas(&self) -> Vec<CommandSchema> {
        self.available_commands().iter().map(CommandName::schema).collect()
    }

    pub fn track_count(&self) -> usize {
        self.beat.as_ref().map_or(0, |b| b.tracks.len())
    }

    /// Handle one invocation. Unknown or unavailable commands yield `None`.
    pub fn dispatch(&self, invocation: &Invocation) -> Option<Reply> {
        let command = CommandName::parse(&invocation.command)?;
        if !self.is_available(command) {
            debug!(command = command.name(), "ignoring invocation of unavailable command");
            return None;
        }
        debug!(command = command.name(), options = ?invocation.options, "dispatching");

        let mut rng = self.next_rng();
        let reply = match command {
            CommandName::Beat => {
                let data = self.beat.as_ref()?;
                let opts = BeatOptions::from_invocation(invocation);
                Ok(beat(&data.tracks, &opts, self.max_beats, &mut rng))
            }
            CommandName::Matchup => {
                let data = self.matchup.as_ref()?;
                matchup::matchup(&data.characters, &data.roster, &data.series, &mut rng)
                    .map_err(BotError::from)
            }
            CommandName::Structure => {
                let opts = StructureOptions::from_invocation(invocation);
                structure(&opts, &mut rng).map_err(BotError::from)
            }
        };

        Some(reply.unwrap_or_else(|e| {
            error!(command = command.name(), "command failed: {}", e);
            Reply::text(INTERNAL_ERROR_REPLY)
        }))
    }

    /// A fresh RNG per invocation; seeded runs step the seed each time.
    fn next_rng(&self) -> StdRng {
        let count = self.invocation_count.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(count)),
            None => StdRng::from_entropy(),
        }
    }
}

impl BotBuilder {
    pub fn config(mut self, config: BotConfig) -> Self {
        self.config = config;
        self
    }

    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn max_beats(mut self, max_beats: usize) -> Self {
        self.config.max_beats = max_beats;
        self
    }

    /// Provide tracks directly (for testing without files).
    pub fn with_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = Some(tracks);
        self
    }

    /// Provide characters directly (for testing without files).
    pub fn with_characters(mut self, characters: Vec<Character>) -> Self {
        self.characters = Some(characters);
        self
    }

    /// Provide the roster directly (for testing without files).
    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Provide the series grammar directly (for testing without files).
    pub fn with_series(mut self, series: GrammarSet) -> Self {
        self.series = Some(series);
        self
    }

    /// Load every command's data. Failures are logged and only disable the
    /// command they belong to.
    pub fn build(self) -> Bot {
        let BotBuilder {
            config,
            tracks,
            characters,
            roster,
            series,
        } = self;

        let beat = report_load(
            CommandName::Beat,
            match tracks {
                Some(tracks) => Ok(tracks),
                None => catalog::load_tracks(&config.tracks_path()).map_err(BotError::from),
            }
            .map(|tracks| {
                catalog::report_problems("beats", &catalog::check_tracks(&tracks));
                BeatData { tracks }
            }),
        );

        let matchup = report_load(
            CommandName::Matchup,
            load_matchup_data(&config, characters, roster, series),
        );

        report_load(CommandName::Structure, Ok(()));

        Bot {
            beat,
            matchup,
            max_beats: config.max_beats,
            seed: config.seed,
            invocation_count: AtomicU64::new(0),
        }
    }
}

fn report_load<T>(command: CommandName, result: Result<T, BotError>) -> Option<T> {
    match result {
        Ok(data) => {
            info!("Successfully loaded command {}", command.name());
            Some(data)
        }
        Err(e) => {
            error!("Failed to load command {}: {}", command.name(), e);
            None
        }
    }
}

fn load_matchup_data(
    config: &BotConfig,
    characters: Option<Vec<Character>>,
    roster: Option<Roster>,
    series: Option<GrammarSet>,
) -> Result<MatchupData, BotError> {
    let characters = match characters {
        Some(characters) => characters,
        None => catalog::load_characters(&config.characters_path())?,
    };
    let roster = match roster {
        Some(roster) => roster,
        None => catalog::load_roster(&config.roster_path())?,
    };
    let series = match series {
        Some(series) => series,
        None => load_series(config)?,
    };
    catalog::report_problems("characters", &catalog::check_characters(&characters));
    catalog::report_problems("roster", &catalog::check_roster(&roster));
    matchup::validate(&characters, &roster)?;
    matchup::validate_series(&series)?;

    Ok(MatchupData {
        characters,
        roster,
        series,
    })
}

/// The built-in word banks, overridden rule by rule by a configured or
/// data-dir `series.ron`.
fn load_series(config: &BotConfig) -> Result<GrammarSet, BotError> {
    let mut grammar = GrammarSet::builtin_series()?;
    let path = match &config.series {
        Some(path) => Some(path.clone()),
        None => Some(config.data_dir.join("series.ron")).filter(|p| p.exists()),
    };
    if let Some(path) = path {
        grammar.merge(GrammarSet::load_from_ron(&path)?);
        debug!("Merged series grammar from {}", path.display());
    }
    Ok(grammar)
}
