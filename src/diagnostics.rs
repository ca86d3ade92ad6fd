//! Append-only diagnostic log (`settings.log`).
//!
//! Every load, save and recovery step is recorded here with a timestamp so that
//! lost-settings reports can be reconstructed after the fact. Writing is best
//! effort: failures are reported through tracing and otherwise ignored.

use std::io::Write;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::logging::warn;

#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
}

impl DiagnosticLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line. Never fails.
    pub fn write(&self, text: impl AsRef<str>) {
        if let Err(_e) = self.append(text.as_ref()) {
            warn!(path = %self.path.display(), error = %_e, "failed to write settings log");
        }
    }

    fn append(&self, text: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        let mut file = fs_err::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{}] {}", timestamp(), text)
    }
}

fn timestamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(format)
        .unwrap_or_else(|_| "????-??-?? ??:??:??".to_string())
}
