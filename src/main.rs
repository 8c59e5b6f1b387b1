//! Binary entrypoint for the retrorpg CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `new --name <n> [--affinity <a>] [--difficulty <d>] [--slot <n>]` - roll a character and play
//! - `play [--slot <n> | --save <name>]` - resume a save (newest when none given),
//!   offering a new character when it cannot be read
//! - `list [--json]` - list saves, newest first
//! - `show <save>` - print a save's character sheet
//! - `delete <save>` - remove a save
//!
//! See the library crate docs for module-level details: `retrorpg::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::io::{self, Write};

use retrorpg::config::Config;
use retrorpg::game::actions::{dispatch, Action, ActionOutcome};
use retrorpg::game::catalog::ContentCatalog;
use retrorpg::game::difficulty::Difficulty;
use retrorpg::game::magic::MagicAffinity;
use retrorpg::game::session::GameSession;
use retrorpg::game::world::START_SCENE;
use retrorpg::play::{self, LoopExit, PlayOptions};
use retrorpg::storage::SaveStore;

#[derive(Parser)]
#[command(name = "retrorpg")]
#[command(about = "A turn-based text RPG with plain-text save files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Create a character and start playing
    New {
        /// Character name
        #[arg(short, long)]
        name: String,
        /// Magic affinity: fire, water, earth, wind, light, dark (or none)
        #[arg(short, long, default_value = "none")]
        affinity: String,
        /// Difficulty: easy, normal, hard, extreme, ultimate (defaults to config)
        #[arg(short, long)]
        difficulty: Option<String>,
        /// Save slot used for saves in this run
        #[arg(short, long)]
        slot: Option<u32>,
    },
    /// Resume a saved game
    Play {
        /// Numbered save slot
        #[arg(short, long, conflicts_with = "save")]
        slot: Option<u32>,
        /// Save file name as shown by `list`
        #[arg(long)]
        save: Option<String>,
    },
    /// List saved games
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the character sheet stored in a save
    Show { save: String },
    /// Delete a save
    Delete { save: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        info!("Initializing new configuration");
        Config::create_default(&cli.config)?;
        println!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = match Config::load(&cli.config) {
        Ok(config) => Some(config),
        Err(e) => {
            if std::path::Path::new(&cli.config).exists() {
                return Err(e);
            }
            None
        }
    };
    init_logging(&config, cli.verbose);
    let config = config.unwrap_or_default();
    let store = SaveStore::open(&config.storage.save_dir)?;

    match cli.command {
        Commands::Init => {}
        Commands::New {
            name,
            affinity,
            difficulty,
            slot,
        } => {
            let difficulty: Difficulty = match difficulty {
                Some(d) => d.parse()?,
                None => config.game.difficulty()?,
            };
            let affinity = parse_affinity(&affinity)?;
            let mut rng = rand::thread_rng();
            let mut session =
                GameSession::new_game(&name, affinity, difficulty, ContentCatalog::standard(), &mut rng)?;
            if config.game.start_scene != START_SCENE {
                session.place_at_start(&config.game.start_scene)?;
            }
            info!("Starting new game on {}", difficulty);
            run_play(&mut session, &store, &config, slot)?;
        }
        Commands::Play { slot, save } => {
            let name = match (slot, save) {
                (Some(n), _) => Some(format!("save_slot_{}", n)),
                (None, Some(name)) => Some(name),
                (None, None) => store.list()?.into_iter().next().map(|s| s.file),
            };
            let mut rng = rand::thread_rng();
            let stdin = io::stdin();
            let resumed = play::load_or_start_new(
                &store,
                name.as_deref(),
                &config.game,
                &mut stdin.lock(),
                &mut io::stdout(),
                &mut rng,
            )?;
            match resumed {
                Some(mut session) => run_play(&mut session, &store, &config, slot)?,
                None => println!("再见！"),
            }
        }
        Commands::List { json } => {
            let saves = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&saves)?);
            } else if saves.is_empty() {
                println!("No saves in {}", store.dir().display());
            } else {
                for s in saves {
                    let when = s
                        .timestamp
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<24} {:<16} Lv{:<3} {:<8} day {:<4} {}",
                        s.file, s.character, s.level, s.difficulty, s.day, when
                    );
                }
            }
        }
        Commands::Show { save } => {
            let catalog = ContentCatalog::standard();
            let record = store.load(&save, &catalog)?;
            let mut session = GameSession::restore(record, catalog);
            let mut rng = rand::thread_rng();
            if let ActionOutcome::Continue(lines) = dispatch(&mut session, Action::ShowStatus, &mut rng)? {
                for line in lines {
                    println!("{}", line);
                }
            }
        }
        Commands::Delete { save } => {
            store.delete(&save)?;
            println!("Deleted {}", save);
        }
    }

    Ok(())
}

fn parse_affinity(s: &str) -> Result<Option<MagicAffinity>> {
    if s.eq_ignore_ascii_case("none") || s.is_empty() {
        return Ok(None);
    }
    Ok(Some(s.parse()?))
}

fn run_play(session: &mut GameSession, store: &SaveStore, config: &Config, slot: Option<u32>) -> Result<()> {
    let options = PlayOptions {
        auto_save_chance: config.game.effective_auto_save_chance(),
        slot,
    };
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let mut rng = rand::thread_rng();
    match play::run(session, store, &options, &mut input, &mut out, &mut rng)? {
        LoopExit::Menu => writeln!(out, "再见！")?,
        LoopExit::EndOfInput => warn!("input closed; unsaved progress since the last save is lost"),
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
    if let Some(f) = file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));

        // Mirror to the console only when stdout is a terminal
        let is_tty = atty::is(atty::Stream::Stdout);

        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
