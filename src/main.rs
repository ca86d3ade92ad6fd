use clap::{Parser, Subcommand};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use settings_store::{ConfigError, Settings, SettingsConfig, SettingsError, Store, Value, ValueKind, read_snapshot};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

#[derive(Parser)]
#[command(name = "settings-store")]
#[command(about = "Inspect and edit a crash-tolerant settings store")]
struct Cli {
    /// Directory holding the settings files (defaults to the platform data dir)
    #[arg(long, global = true, env = "SETTINGS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Application name used to derive the default data directory
    #[arg(long, global = true)]
    app: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get {
        /// Key to read
        key: String,

        /// Read through the typed getter for this kind (overrides are parsed)
        #[arg(long)]
        kind: Option<ValueKind>,
    },

    /// Store a value and save
    Set {
        /// Key to write
        key: String,

        /// Value text; bytes are given as hex
        value: String,

        /// Kind of the value: bool, int, long, float, string, bytes
        #[arg(short, long, default_value = "string")]
        kind: ValueKind,
    },

    /// Remove a key and save
    Remove {
        /// Key to remove
        key: String,
    },

    /// List all keys with their kinds and values
    List,

    /// Remove every key and save
    Clear,

    /// List rotating backup files, newest first
    Backups,

    /// Decode a snapshot file and report whether it is valid
    Check {
        /// Snapshot file to check
        file: PathBuf,
    },
}

fn main() -> Result<(), AppError> {
    init_logging();

    let cli = Cli::parse();

    if let Commands::Check { file } = &cli.command {
        let store = read_snapshot(file)?;
        println!("{}: ok, {} entries", file.display(), store.len());
        print_entries(&store);
        return Ok(());
    }

    let settings = open(&cli)?;
    settings.load()?;

    match cli.command {
        Commands::Get { key, kind } => {
            let value = match kind {
                Some(kind) => settings.try_get(&key, kind)?,
                None => settings.get(&key),
            };
            let value = value.ok_or(AppError::KeyNotFound(key))?;
            println!("{}", value);
        }
        Commands::Set { key, value, kind } => {
            let value = Value::parse(kind, &value)?;
            settings.put(key, value);
            persist(&settings)?;
        }
        Commands::Remove { key } => {
            if !settings.has(&key) {
                return Err(AppError::KeyNotFound(key));
            }
            settings.remove(&key);
            persist(&settings)?;
        }
        Commands::List => {
            for key in settings.keys() {
                if let Some(value) = settings.get(&key) {
                    println!("{} ({}) = {}", key, value.kind(), value);
                }
            }
        }
        Commands::Clear => {
            let count = settings.key_size();
            settings.clear();
            persist(&settings)?;
            eprintln!("Removed {} keys", count);
        }
        Commands::Backups => {
            for path in settings.backup_files()? {
                println!("{}", path.display());
            }
        }
        Commands::Check { .. } => {}
    }

    Ok(())
}

fn open(cli: &Cli) -> Result<Settings, AppError> {
    let mut config = match &cli.config {
        Some(path) => SettingsConfig::from_file(path)?,
        None => SettingsConfig::default(),
    };
    if let Some(app) = &cli.app {
        config.app_name = app.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    Ok(Settings::new(config)?)
}

/// Save and wait for the backup rotation so the process can exit.
fn persist(settings: &Settings) -> Result<(), AppError> {
    settings.save()?;
    settings.flush_backups();
    Ok(())
}

fn print_entries(store: &Store) {
    let mut entries: Vec<_> = store.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        println!("  {} ({}) = {}", key, value.kind(), value);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = fmt::layer()
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();
}
