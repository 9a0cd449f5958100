/// Catalog Linter: validates the bot's data files before deployment.
///
/// Usage: catalog_linter [--data-dir <dir>] [--series <file>]
///
/// Exits with status 1 when any catalog fails to load or has errors.

use anyhow::Result;
use clap::Parser;
use rap_battle_bot::core::catalog::{self, Problem};
use rap_battle_bot::core::grammar::GrammarSet;
use rap_battle_bot::core::matchup::SERIES_RULE;
use rap_battle_bot::core::pipeline::BotConfig;
use std::path::PathBuf;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory containing the beat, character and roster catalogs.
    #[clap(long, env = "BOT_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Series grammar to lint instead of `<data-dir>/series.ron`.
    #[clap(long)]
    pub series: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    let config = BotConfig {
        data_dir: args.data_dir,
        series: args.series,
        ..BotConfig::default()
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match catalog::load_tracks(&config.tracks_path()) {
        Ok(tracks) => {
            println!("Loaded {} beats", tracks.len());
            collect("beats", catalog::check_tracks(&tracks), &mut errors, &mut warnings);
        }
        Err(e) => errors.push(format!("beats: {}", e)),
    }

    match catalog::load_characters(&config.characters_path()) {
        Ok(characters) => {
            println!("Loaded {} characters", characters.len());
            collect(
                "characters",
                catalog::check_characters(&characters),
                &mut errors,
                &mut warnings,
            );
        }
        Err(e) => errors.push(format!("characters: {}", e)),
    }

    match catalog::load_roster(&config.roster_path()) {
        Ok(roster) => {
            println!("Loaded {} roster members", roster.len());
            collect("roster", catalog::check_roster(&roster), &mut errors, &mut warnings);
        }
        Err(e) => errors.push(format!("roster: {}", e)),
    }

    let mut grammar = match GrammarSet::builtin_series() {
        Ok(grammar) => grammar,
        Err(e) => {
            errors.push(format!("built-in series grammar: {}", e));
            GrammarSet::default()
        }
    };
    let series_path = config
        .series
        .clone()
        .or_else(|| Some(config.data_dir.join("series.ron")).filter(|p| p.exists()));
    if let Some(path) = series_path {
        match GrammarSet::load_from_ron(&path) {
            Ok(gs) => {
                println!("Loaded series grammar from {}", path.display());
                grammar.merge(gs);
            }
            Err(e) => errors.push(format!("series: {}", e)),
        }
    }
    let (grammar_errors, grammar_warnings) = lint_grammar(&grammar);
    // Per-rule checks passed; look for longer cycles from the entry rule.
    if grammar_errors.is_empty() {
        if let Err(e) = grammar.validate(SERIES_RULE) {
            errors.push(format!("series: {}", e));
        }
    }
    errors.extend(grammar_errors);
    warnings.extend(grammar_warnings);

    println!("\n=== Catalog Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
    Ok(())
}

fn collect(source: &str, problems: Vec<Problem>, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    for problem in problems {
        match problem {
            Problem::Error(msg) => errors.push(format!("{}: {}", source, msg)),
            Problem::Warning(msg) => warnings.push(format!("{}: {}", source, msg)),
        }
    }
}

fn lint_grammar(grammar: &GrammarSet) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !grammar.rules.contains_key(SERIES_RULE) {
        errors.push(format!("series: no '{}' entry rule", SERIES_RULE));
    }

    for (name, rule) in &grammar.rules {
        if rule.alternatives.is_empty() {
            errors.push(format!("series: rule '{}' has no alternatives", name));
        } else if rule.alternatives.iter().all(|a| a.weight == 0) {
            errors.push(format!("series: rule '{}' has only zero weights", name));
        } else if rule.alternatives.len() < 3 {
            warnings.push(format!(
                "series: rule '{}' has only {} alternatives (minimum 3 recommended)",
                name,
                rule.alternatives.len()
            ));
        }

        for alt in &rule.alternatives {
            for ref_name in alt.template.rule_refs() {
                if !grammar.rules.contains_key(ref_name) {
                    errors.push(format!(
                        "series: rule '{}' references non-existent rule '{}'",
                        name, ref_name
                    ));
                } else if ref_name == name {
                    errors.push(format!("series: rule '{}' references itself", name));
                }
            }
        }
    }

    (errors, warnings)
}
