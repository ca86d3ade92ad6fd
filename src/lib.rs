//! A crash-tolerant local settings store.
//!
//! Settings are kept in memory as a table of typed values and persisted to a
//! compact binary file. Loading detects corrupt files and falls back to the
//! last known-good snapshot or to a rotating history of backups. Environment
//! overrides can shadow persisted values without ever being written.
//!
//! # Quick Start
//!
//! ```ignore
//! use settings_store::prelude::*;
//!
//! let settings = Settings::builder().app_name("my-game").build()?;
//! settings.load()?;
//!
//! settings.put("volume", 0.8f32);
//! let volume = settings.get_float_or("volume", 1.0);
//! settings.save()?;
//! ```
//!
//! # Files
//!
//! Under the data directory:
//!
//! - `settings.bin` - the primary snapshot
//! - `settings_backup.bin` - the last snapshot that loaded successfully
//! - `settings_backups/<epoch-millis>.bin` - rotating history, 10 files by default
//! - `settings.log` - timestamped diagnostic log
//!
//! # Feature Flags
//!
//! - `config` - Load [`SettingsConfig`] from TOML (enabled by default)
//! - `json` - Store serde values as JSON bytes (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `cli` - Enable the command-line binary
//! - `full` - Enable all features

mod logging;

pub mod backup;
pub mod codec;
pub mod config;
pub mod diagnostics;
mod error;
mod files;
#[cfg(feature = "json")]
mod json;
pub mod layout;
pub mod overrides;
pub mod prelude;
pub mod recovery;
pub mod settings;
pub mod store;
pub mod value;

pub use error::{Result, SettingsError};

pub use backup::{BackupWorker, DEFAULT_MAX_BACKUPS};
pub use codec::{CodecError, decode, encode};
#[cfg(feature = "config")]
pub use config::ConfigError;
pub use config::SettingsConfig;
pub use layout::Layout;
pub use overrides::{EnvProperties, MapProperties, Overrides, PropertySource};
pub use recovery::read_snapshot;
pub use settings::{BindingStore, ErrorHandler, Settings, SettingsBuilder};
pub use store::Store;
pub use value::{Value, ValueKind};
