use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The value type of a slash-command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSchema {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
}

/// The registration payload for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<OptionSchema>,
}

impl CommandSchema {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            options: Vec::new(),
        }
    }

    fn option(mut self, kind: OptionKind, name: &str, description: &str) -> Self {
        self.options.push(OptionSchema {
            name: name.to_string(),
            description: description.to_string(),
            kind,
        });
        self
    }

    pub fn beat() -> Self {
        Self::new("beat", "Serves up a funky fresh beat")
            .option(OptionKind::String, "name", "Name of the beat you're looking for.")
            .option(
                OptionKind::String,
                "exact-name",
                "Name of the beat you're looking for, exactly as typed (no \"fuzzy\" matching).",
            )
            .option(
                OptionKind::String,
                "name-contains",
                "Filter by beats whose names include this text somewhere",
            )
            .option(
                OptionKind::String,
                "producers",
                "Beat producer(s) to filter by, separated with commas.",
            )
            .option(
                OptionKind::String,
                "genres",
                "Genre(s) to filter by, separated with commas. Displays beats with at least one matching genre.",
            )
            .option(
                OptionKind::String,
                "moods",
                "Mood(s) to filter by, separated with commas. Displays beats with at least one matching mood.",
            )
            .option(
                OptionKind::String,
                "bpm",
                "Tempo (in beats per minute) of the beat you want. This can be a number or a range (e.g. \"80-90\").",
            )
            .option(
                OptionKind::Boolean,
                "purchasable",
                "Filter out beats that've definitely been sold. Doesn't guarantee that returned beats can be bought.",
            )
            .option(
                OptionKind::Boolean,
                "every",
                "Return every beat (up to a limit) matching your filter(s), instead of just one.",
            )
            .option(OptionKind::Integer, "num", "Return this many matching beats.")
            .option(
                OptionKind::String,
                "url",
                "Filter beats whose audio file links contain this text.",
            )
    }

    pub fn matchup() -> Self {
        Self::new("matchup", "Generates a random rap battle matchup")
    }

    pub fn structure() -> Self {
        Self::new(
            "structure",
            "Generates a random verse structure, optionally with a length (and number of verses) of your choice",
        )
        .option(OptionKind::Integer, "length", "Length of the battle, in bars")
        .option(OptionKind::Integer, "verses", "Number of total verses in the battle")
    }

    pub fn find_option(&self, name: &str) -> Option<&OptionSchema> {
        self.options.iter().find(|o| o.name == name)
    }
}

/// A typed option value delivered with an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl OptionValue {
    /// Parses raw user text as an option of the given kind.
    pub fn parse(kind: OptionKind, raw: &str) -> Option<OptionValue> {
        match kind {
            OptionKind::String => Some(OptionValue::String(raw.to_string())),
            OptionKind::Integer => raw.trim().parse().ok().map(OptionValue::Integer),
            OptionKind::Boolean => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(OptionValue::Boolean(true)),
                "false" | "no" | "0" => Some(OptionValue::Boolean(false)),
                _ => None,
            },
        }
    }
}

/// One command invocation as handed over by the chat client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub command: String,
    #[serde(default)]
    pub options: FxHashMap<String, OptionValue>,
}

impl Invocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            options: FxHashMap::default(),
        }
    }

    pub fn with(mut self, name: &str, value: OptionValue) -> Self {
        self.options.insert(name.to_string(), value);
        self
    }

    pub fn with_string(self, name: &str, value: &str) -> Self {
        self.with(name, OptionValue::String(value.to_string()))
    }

    pub fn with_integer(self, name: &str, value: i64) -> Self {
        self.with(name, OptionValue::Integer(value))
    }

    pub fn with_boolean(self, name: &str, value: bool) -> Self {
        self.with(name, OptionValue::Boolean(value))
    }

    /// Empty strings and values of another type read as absent.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.options.get(name) {
            Some(OptionValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        match self.options.get(name) {
            Some(OptionValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationParseError {
    #[error("commands start with '/', e.g. /beat bpm:80-90")]
    MissingSlash,
    #[error("unbalanced quotes in command line")]
    UnbalancedQuotes,
    #[error("unknown command /{0}")]
    UnknownCommand(String),
    #[error("expected option:value, got \"{0}\"")]
    MalformedOption(String),
    #[error("/{command} has no option \"{option}\"")]
    UnknownOption { command: String, option: String },
    #[error("option \"{option}\" expects a {kind:?} value, got \"{value}\"")]
    InvalidValue {
        option: String,
        kind: OptionKind,
        value: String,
    },
}

impl Invocation {
    /// Parse a typed command line such as `/beat bpm:80-90 "name:night drive"`.
    ///
    /// Values are converted according to the option kinds in `schemas`, so the
    /// result looks like an invocation delivered by the chat client.
    pub fn parse_line(line: &str, schemas: &[CommandSchema]) -> Result<Invocation, InvocationParseError> {
        let tokens = shlex::split(line).ok_or(InvocationParseError::UnbalancedQuotes)?;
        let (head, rest) = tokens
            .split_first()
            .ok_or(InvocationParseError::MissingSlash)?;
        let name = head
            .strip_prefix('/')
            .ok_or(InvocationParseError::MissingSlash)?;
        let schema = schemas
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| InvocationParseError::UnknownCommand(name.to_string()))?;

        let mut invocation = Invocation::new(name);
        for token in rest {
            let (key, raw) = token
                .split_once(':')
                .ok_or_else(|| InvocationParseError::MalformedOption(token.clone()))?;
            let option = schema
                .find_option(key)
                .ok_or_else(|| InvocationParseError::UnknownOption {
                    command: name.to_string(),
                    option: key.to_string(),
                })?;
            let value = OptionValue::parse(option.kind, raw).ok_or_else(|| {
                InvocationParseError::InvalidValue {
                    option: key.to_string(),
                    kind: option.kind,
                    value: raw.to_string(),
                }
            })?;
            invocation = invocation.with(key, value);
        }
        Ok(invocation)
    }
}

/// Options of the `/beat` command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatOptions {
    pub exact_name: Option<String>,
    pub name_contains: Option<String>,
    pub fuzzy_name: Option<String>,
    pub url: Option<String>,
    pub bpm: Option<String>,
    pub producers: Option<String>,
    pub genres: Option<String>,
    pub moods: Option<String>,
    pub purchasable: bool,
    pub every: bool,
    pub num: Option<i64>,
}

impl BeatOptions {
    pub fn from_invocation(invocation: &Invocation) -> Self {
        let string = |name: &str| invocation.get_string(name).map(str::to_string);
        Self {
            exact_name: string("exact-name"),
            name_contains: string("name-contains"),
            fuzzy_name: string("name"),
            url: string("url"),
            bpm: string("bpm"),
            producers: string("producers"),
            genres: string("genres"),
            moods: string("moods"),
            purchasable: invocation.get_boolean("purchasable").unwrap_or(false),
            every: invocation.get_boolean("every").unwrap_or(false),
            num: invocation.get_integer("num"),
        }
    }
}

/// Options of the `/structure` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureOptions {
    /// Total couplet budget of the battle.
    pub length: Option<i64>,
    pub verses: Option<i64>,
}

impl StructureOptions {
    pub fn from_invocation(invocation: &Invocation) -> Self {
        Self {
            length: invocation.get_integer("length"),
            verses: invocation.get_integer("verses"),
        }
    }
}
