//! Settings store configuration.

use std::path::{Path, PathBuf};

#[cfg(feature = "config")]
use serde::Deserialize;

use crate::backup::DEFAULT_MAX_BACKUPS;
use crate::layout::Layout;

/// Environment variable that lists the names of override properties.
pub const DEFAULT_OVERRIDE_PROPERTY: &str = "SETTINGS_OVERRIDE";

/// Store configuration, optionally loaded from a TOML file.
///
/// ```toml
/// app_name = "my-game"
/// data_dir = "/var/lib/my-game"
/// autosave = true
/// max_backups = 10
/// override_property = "SETTINGS_OVERRIDE"
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Deserialize))]
#[cfg_attr(feature = "config", serde(default, deny_unknown_fields))]
pub struct SettingsConfig {
    /// Application name, used to derive the default data directory.
    pub app_name: String,
    /// Directory holding the settings files. Defaults to the platform data
    /// directory for `app_name`.
    pub data_dir: Option<PathBuf>,
    /// Whether [`crate::Settings::autosave`] writes pending changes.
    pub autosave: bool,
    /// Number of files kept in the backup history.
    pub max_backups: usize,
    /// Property holding the comma-separated list of override names.
    pub override_property: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            app_name: "app".to_string(),
            data_dir: None,
            autosave: true,
            max_backups: DEFAULT_MAX_BACKUPS,
            override_property: DEFAULT_OVERRIDE_PROPERTY.to_string(),
        }
    }
}

impl SettingsConfig {
    /// Resolve the file layout for this configuration.
    pub fn layout(&self) -> Layout {
        match &self.data_dir {
            Some(dir) => Layout::new(dir),
            None => Layout::for_app(&self.app_name),
        }
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

#[cfg(feature = "config")]
impl SettingsConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs_err::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// Configuration error.
#[cfg(feature = "config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),
    /// TOML parse error.
    #[error("Failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[cfg(all(test, feature = "config"))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
app_name = "my-game"
data_dir = "/var/lib/my-game"
autosave = false
max_backups = 3
"#;
        let config = SettingsConfig::from_toml(toml).unwrap();
        assert_eq!(config.app_name, "my-game");
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/my-game")));
        assert!(!config.autosave);
        assert_eq!(config.max_backups, 3);
        assert_eq!(config.override_property, DEFAULT_OVERRIDE_PROPERTY);
        assert_eq!(
            config.layout().primary(),
            PathBuf::from("/var/lib/my-game/settings.bin")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SettingsConfig::from_toml("").unwrap();
        assert_eq!(config, SettingsConfig::default());
        assert_eq!(config.max_backups, 10);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SettingsConfig::from_toml("max_backup = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SettingsConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
