//! Unified error type for the settings store.
//!
//! Module-specific errors ([`CodecError`], [`ConfigError`]) are wrapped by
//! [`SettingsError`], so callers only need to handle a single type.

use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;
#[cfg(feature = "config")]
use crate::config::ConfigError;

/// Unified error type for all settings store operations.
///
/// # Example
///
/// ```ignore
/// use settings_store::{Result, Settings};
///
/// fn bump_launches(settings: &Settings) -> Result<()> {
///     let launches = settings.get_int("launches");
///     settings.put("launches", launches + 1);
///     settings.save()
/// }
/// ```
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A settings file failed to decode.
    #[error("Corrupt settings file {}: {source}", .path.display())]
    CorruptFormat {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The store could not be framed, e.g. a string exceeds the length limit.
    #[error("Failed to encode settings: {0}")]
    Encode(#[source] CodecError),

    /// An underlying read, write, copy or delete failed. The source error
    /// already names the file.
    #[error("I/O error: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value was not of the requested kind, or a kind name was not recognized.
    #[error("Invalid value type{}: expected {expected}, found {found}", key_suffix(.key))]
    InvalidValueType {
        key: Option<String>,
        expected: String,
        found: String,
    },

    /// A file that was expected to exist is missing.
    #[error("Settings file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// The primary file and every backup candidate failed to load.
    #[error("Failed to load settings: primary file and {attempts} backup candidate(s) are unreadable")]
    RecoveryExhausted { attempts: usize },

    /// The background backup thread could not be started.
    #[error("Failed to start backup worker: {0}")]
    Worker(#[source] std::io::Error),

    /// The key-binding hook failed.
    #[error("Key binding persistence failed: {0}")]
    Bindings(String),

    /// Structured value (de)serialization failed.
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[cfg(feature = "config")]
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_deref()
        .map(|k| format!(" for '{}'", k))
        .unwrap_or_default()
}

/// A [`Result`] type alias using [`SettingsError`].
pub type Result<T> = std::result::Result<T, SettingsError>;

impl SettingsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, source: CodecError) -> Self {
        Self::CorruptFormat {
            path: path.into(),
            source,
        }
    }

    /// Attach the key an invalid-value-type error refers to.
    pub(crate) fn for_key(self, key: &str) -> Self {
        match self {
            Self::InvalidValueType {
                expected, found, ..
            } => Self::InvalidValueType {
                key: Some(key.to_string()),
                expected,
                found,
            },
            other => other,
        }
    }

    /// Returns `true` if this is a corrupt-format error.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptFormat { .. })
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if this is an invalid-value-type error.
    pub fn is_invalid_value_type(&self) -> bool {
        matches!(self, Self::InvalidValueType { .. })
    }

    /// Returns `true` if a file was missing.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::MissingFile(_))
    }

    /// Returns `true` if no settings file could be recovered.
    pub fn is_recovery_exhausted(&self) -> bool {
        matches!(self, Self::RecoveryExhausted { .. })
    }
}
