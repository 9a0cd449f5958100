/// Battle shell: interactive command prompt for trying the bot locally.
///
/// Usage: battle_shell [--config <file>] [--data-dir <dir>] [--seed <n>]
///
/// Commands:
///   /beat key:value ...   run a slash command, e.g. /beat bpm:80-90 num:3
///   schemas               print the registration payloads as JSON
///   commands              list the commands that loaded
///   help                  list commands
///   quit                  exit

use anyhow::{Context, Result};
use clap::Parser;
use rap_battle_bot::core::pipeline::{Bot, BotConfig};
use rap_battle_bot::schema::command::Invocation;
use rap_battle_bot::schema::reply::Reply;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a RON bot configuration. Flags below override its values.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Directory containing the beat, character and roster catalogs.
    #[clap(long, env = "BOT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Fixed RNG seed for reproducible replies.
    #[clap(long, env = "BOT_SEED")]
    pub seed: Option<u64>,

    /// Maximum number of beat cards in one reply.
    #[clap(long)]
    pub max_beats: Option<usize>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let config = resolve_config(&cli_args)?;
    info!("Data directory: {}", config.data_dir.display());
    let bot = Bot::builder().config(config).build();

    let schemas = bot.schemas();
    let names: Vec<String> = schemas.iter().map(|s| format!("/{}", s.name)).collect();
    println!("Loaded commands: {}", names.join(", "));
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("battle> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "quit" | "exit" | "q" => {
                println!("Peace.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "schemas" => println!("{}", serde_json::to_string_pretty(&schemas)?),
            "commands" => {
                for schema in &schemas {
                    println!("  /{:<10} {}", schema.name, schema.description);
                }
            }
            _ => match Invocation::parse_line(line, &schemas) {
                Ok(invocation) => match bot.dispatch(&invocation) {
                    Some(reply) => print_reply(&reply),
                    None => println!("(no reply)"),
                },
                Err(e) => println!("ERROR: {}", e),
            },
        }
    }

    Ok(())
}

fn resolve_config(args: &CliArgs) -> Result<BotConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            BotConfig::load_from_ron(path)
                .with_context(|| format!("reading config {}", path.display()))?
        }
        None => BotConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(max_beats) = args.max_beats {
        config.max_beats = max_beats;
    }
    Ok(config)
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Text(text) => println!("{}", text),
        Reply::Cards(cards) => {
            for card in cards {
                println!("\n{}", card.title);
                if let Some(description) = &card.description {
                    println!("  {}", description);
                }
                for field in &card.fields {
                    println!("  {}: {}", field.name, field.value);
                }
                if let Some(footer) = &card.footer {
                    println!("  ({})", footer.text);
                }
            }
            println!();
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /beat [name:..] [exact-name:..] [name-contains:..] [url:..]");
    println!("        [producers:a,b] [genres:a,b] [moods:a,b] [bpm:80-90]");
    println!("        [purchasable:true] [every:true] [num:3]");
    println!("  /matchup");
    println!("  /structure [length:10] [verses:4]");
    println!("  schemas    print registration payloads as JSON");
    println!("  commands   list loaded commands");
    println!("  help       show this message");
    println!("  quit       exit");
    println!("\nQuote values with spaces: /beat \"name:night drive\"");
}
