/// Weighted word-bank grammar with templates, RON loading and expansion.
///
/// Drives the matchup series names: a rule picks one of its weighted
/// alternatives, and `{rule}` references inside the chosen template are
/// expanded recursively.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Expansion depth after which a rule chain is considered runaway recursion.
const MAX_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("template parse error: {0}")]
    TemplateParse(String),
    #[error("rule not found: {0}")]
    RuleNotFound(String),
    #[error("rule '{0}' has no alternatives")]
    EmptyRule(String),
    #[error("expansion of '{0}' nested too deeply")]
    RecursionLimit(String),
    #[error("rule '{rule}' references unknown rule '{reference}'")]
    UnknownReference { rule: String, reference: String },
    #[error("rule '{0}' can expand into itself")]
    Cycle(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Reference to another grammar rule: `{rule_name}`.
    RuleRef(String),
}

/// A parsed template: a sequence of segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{rule_name}` → `RuleRef`
    /// - `{{` / `}}` → literal `{` / `}`
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, GrammarError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' {
                if i + 1 < len && chars[i + 1] == '{' {
                    literal_buf.push('{');
                    i += 2;
                    continue;
                }

                if !literal_buf.is_empty() {
                    segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                }

                let start = i + 1;
                let mut end = start;
                while end < len && chars[end] != '}' {
                    if chars[end] == '{' {
                        return Err(GrammarError::TemplateParse(
                            "nested braces are not allowed".to_string(),
                        ));
                    }
                    end += 1;
                }

                if end == len {
                    return Err(GrammarError::TemplateParse("unclosed brace".to_string()));
                }

                let name: String = chars[start..end].iter().collect();
                let name = name.trim();
                if name.is_empty() {
                    return Err(GrammarError::TemplateParse("empty braces".to_string()));
                }

                segments.push(TemplateSegment::RuleRef(name.to_string()));
                i = end + 1;
            } else if chars[i] == '}' {
                if i + 1 < len && chars[i + 1] == '}' {
                    literal_buf.push('}');
                    i += 2;
                    continue;
                }
                return Err(GrammarError::TemplateParse(
                    "unmatched closing brace".to_string(),
                ));
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    /// Names of all rules this template references, in order.
    pub fn rule_refs(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::RuleRef(name) => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }
}

/// A weighted text alternative within a grammar rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    pub weight: u32,
    pub template: Template,
}

/// A single grammar rule with weighted alternatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarRule {
    pub name: String,
    pub alternatives: Vec<Alternative>,
}

/// A set of named grammar rules.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GrammarSet {
    pub rules: FxHashMap<String, GrammarRule>,
}

// The RON file lists alternatives as raw text (or as a plain word bank),
// so it goes through intermediate structs before templates are parsed.

#[derive(Debug, Deserialize)]
struct RonAlternative {
    weight: u32,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Rule")]
struct RonRule {
    #[serde(default)]
    alternatives: Vec<RonAlternative>,
    /// Shorthand for weight-1 literal alternatives.
    #[serde(default)]
    words: Vec<String>,
}

/// The word banks shipped with the crate.
const BUILTIN_SERIES_GRAMMAR: &str = include_str!("../../data/series.ron");

impl GrammarSet {
    /// Load a grammar set from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<GrammarSet, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a grammar set from a RON string.
    pub fn parse_ron(input: &str) -> Result<GrammarSet, GrammarError> {
        let raw: FxHashMap<String, RonRule> = ron::from_str(input)?;
        let mut rules = FxHashMap::default();

        for (name, ron_rule) in raw {
            let mut alternatives = Vec::with_capacity(ron_rule.alternatives.len() + ron_rule.words.len());
            for alt in ron_rule.alternatives {
                alternatives.push(Alternative {
                    weight: alt.weight,
                    template: Template::parse(&alt.text)?,
                });
            }
            for word in ron_rule.words {
                alternatives.push(Alternative {
                    weight: 1,
                    template: Template {
                        segments: vec![TemplateSegment::Literal(word)],
                    },
                });
            }
            rules.insert(name.clone(), GrammarRule { name, alternatives });
        }

        Ok(GrammarSet { rules })
    }

    /// The series-name grammar compiled into the crate.
    pub fn builtin_series() -> Result<GrammarSet, GrammarError> {
        Self::parse_ron(BUILTIN_SERIES_GRAMMAR)
    }

    /// Merge another grammar set into this one. Rules from `other`
    /// override rules in `self` with the same name.
    pub fn merge(&mut self, other: GrammarSet) {
        for (name, rule) in other.rules {
            self.rules.insert(name, rule);
        }
    }

    /// Check that `entry` and every rule reachable from it can expand: each
    /// exists, has an alternative with positive weight, and never leads back
    /// to itself.
    pub fn validate<'a>(&'a self, entry: &'a str) -> Result<(), GrammarError> {
        let mut path = Vec::new();
        let mut checked = FxHashSet::default();
        self.validate_rule(entry, &mut path, &mut checked)
    }

    fn validate_rule<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        checked: &mut FxHashSet<&'a str>,
    ) -> Result<(), GrammarError> {
        if checked.contains(name) {
            return Ok(());
        }
        if path.contains(&name) {
            return Err(GrammarError::Cycle(name.to_string()));
        }
        let rule = self
            .rules
            .get(name)
            .ok_or_else(|| GrammarError::RuleNotFound(name.to_string()))?;
        if rule.alternatives.iter().all(|a| a.weight == 0) {
            return Err(GrammarError::EmptyRule(name.to_string()));
        }

        path.push(name);
        for alt in &rule.alternatives {
            for reference in alt.template.rule_refs() {
                if !self.rules.contains_key(reference) {
                    return Err(GrammarError::UnknownReference {
                        rule: name.to_string(),
                        reference: reference.to_string(),
                    });
                }
                self.validate_rule(reference, path, checked)?;
            }
        }
        path.pop();
        checked.insert(name);
        Ok(())
    }

    /// Expand `rule` into text, choosing alternatives by weight.
    pub fn expand<R: Rng + ?Sized>(&self, rule: &str, rng: &mut R) -> Result<String, GrammarError> {
        let mut out = String::new();
        self.expand_into(rule, rng, 0, &mut out)?;
        Ok(out)
    }

    fn expand_into<R: Rng + ?Sized>(
        &self,
        rule_name: &str,
        rng: &mut R,
        depth: usize,
        out: &mut String,
    ) -> Result<(), GrammarError> {
        if depth >= MAX_DEPTH {
            return Err(GrammarError::RecursionLimit(rule_name.to_string()));
        }
        let rule = self
            .rules
            .get(rule_name)
            .ok_or_else(|| GrammarError::RuleNotFound(rule_name.to_string()))?;

        let weights: Vec<u32> = rule.alternatives.iter().map(|a| a.weight).collect();
        let dist = WeightedIndex::new(&weights)
            .map_err(|_| GrammarError::EmptyRule(rule_name.to_string()))?;
        let chosen = &rule.alternatives[dist.sample(rng)];

        for segment in &chosen.template.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::RuleRef(name) => self.expand_into(name, rng, depth + 1, out)?,
            }
        }
        Ok(())
    }
}
