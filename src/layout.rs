//! On-disk locations of the settings files.

use std::path::{Path, PathBuf};

const PRIMARY_FILE: &str = "settings.bin";
const BACKUP_SNAPSHOT_FILE: &str = "settings_backup.bin";
const BACKUP_DIR: &str = "settings_backups";
const LOG_FILE: &str = "settings.log";

/// Paths of the files kept under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    data_dir: PathBuf,
}

impl Layout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The platform data directory for `app_name`, e.g.
    /// `~/.local/share/<app_name>` on Linux. Falls back to `./<app_name>` when
    /// the platform has no such directory.
    pub fn for_app(app_name: &str) -> Self {
        let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(app_name))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The primary snapshot used for normal loads.
    pub fn primary(&self) -> PathBuf {
        self.data_dir.join(PRIMARY_FILE)
    }

    /// The last snapshot known to load successfully.
    pub fn backup_snapshot(&self) -> PathBuf {
        self.data_dir.join(BACKUP_SNAPSHOT_FILE)
    }

    /// Folder holding the rotating backup history.
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR)
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}
