//! Convenient re-exports for common usage patterns.
//!
//! # Example
//!
//! ```ignore
//! use settings_store::prelude::*;
//!
//! let settings = Settings::new(SettingsConfig::default().with_data_dir("/tmp/app"))?;
//! settings.load()?;
//! ```

// Unified error handling
pub use crate::error::{Result, SettingsError};

// Store and values
pub use crate::settings::{BindingStore, Settings, SettingsBuilder};
pub use crate::store::Store;
pub use crate::value::{Value, ValueKind};

// Configuration and collaborators
pub use crate::backup::BackupWorker;
pub use crate::config::SettingsConfig;
pub use crate::overrides::{EnvProperties, MapProperties, PropertySource};
