//! Loading the store from the primary file, falling back to backups.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::codec;
use crate::diagnostics::DiagnosticLog;
use crate::error::{Result, SettingsError};
use crate::files;
use crate::layout::Layout;
use crate::logging::{error, info, warn};
use crate::store::Store;

/// What [`load`] found on disk.
#[derive(Debug)]
pub(crate) enum LoadOutcome {
    /// Neither the primary nor the backup snapshot exists.
    FreshInstall,
    /// The primary file decoded.
    Primary(Store),
    /// The primary file was unreadable; `from` decoded instead and was copied
    /// over the primary.
    Recovered { store: Store, from: PathBuf },
    /// Nothing decoded.
    Exhausted { attempts: usize },
}

/// Read and decode a single snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Store> {
    let bytes = fs_err::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SettingsError::MissingFile(path.to_path_buf())
        } else {
            SettingsError::io(path, e)
        }
    })?;
    codec::decode(&bytes).map_err(|e| SettingsError::corrupt(path, e))
}

/// Load the store described by `layout`.
///
/// Tries the primary file first. On success the backup snapshot is refreshed
/// from it. Otherwise every file in the backup history plus the backup snapshot
/// is tried, newest first, and the first one that decodes is copied back over
/// the primary file.
pub(crate) fn load(layout: &Layout, log: &DiagnosticLog) -> LoadOutcome {
    let primary = layout.primary();
    let snapshot = layout.backup_snapshot();

    if !primary.exists() && !snapshot.exists() {
        log.write(format!(
            "No settings files found: {} and {}",
            primary.display(),
            snapshot.display()
        ));
        info!(dir = %layout.data_dir().display(), "no settings files, starting fresh");
        return LoadOutcome::FreshInstall;
    }

    let failure = match read_snapshot(&primary) {
        Ok(store) => {
            log.write(format!("Loaded {} values", store.len()));
            refresh_backup_snapshot(&primary, &snapshot, log);
            return LoadOutcome::Primary(store);
        }
        Err(e) => e,
    };

    warn!(error = %failure, "failed to load settings file, attempting backups");
    log.write(format!("Failed to load base file {}: {}", primary.display(), failure));

    let candidates = candidates(layout, log);
    let attempts = candidates.len();

    for candidate in candidates {
        log.write(format!(
            "Attempting to load backup file: '{}'. Length: {}",
            candidate.display(),
            file_len(&candidate)
        ));

        let store = match read_snapshot(&candidate) {
            Ok(store) => store,
            Err(_e) => {
                log.write(format!("| Failed to load backup file {}: {}", candidate.display(), _e));
                warn!(path = %candidate.display(), error = %_e, "backup settings file unreadable");
                continue;
            }
        };

        match files::copy_atomic(&candidate, &primary) {
            Ok(()) => log.write(format!(
                "| Loaded backup settings file after load failure. New settings file length: {}",
                file_len(&primary)
            )),
            Err(e) => log.write(format!(
                "| Loaded backup settings file {} but could not restore the primary file: {}",
                candidate.display(),
                e
            )),
        }
        info!(path = %candidate.display(), entries = store.len(), "recovered settings from backup");

        return LoadOutcome::Recovered {
            store,
            from: candidate,
        };
    }

    error!(attempts, "no readable settings file");
    log.write(format!("All {} backup candidates failed to load", attempts));
    LoadOutcome::Exhausted { attempts }
}

/// Backup history plus the backup snapshot, newest first.
fn candidates(layout: &Layout, log: &DiagnosticLog) -> Vec<PathBuf> {
    let backup_dir = layout.backup_dir();
    let mut found = files::list_files(&backup_dir).unwrap_or_else(|e| {
        log.write(format!("Failed to list {}: {}", backup_dir.display(), e));
        Vec::new()
    });

    let snapshot = layout.backup_snapshot();
    let snapshot_time = files::modified_time(&snapshot).unwrap_or(SystemTime::UNIX_EPOCH);
    found.push((snapshot_time, snapshot));

    files::sort_newest_first(&mut found);
    found.into_iter().map(|(_, path)| path).collect()
}

fn refresh_backup_snapshot(primary: &Path, snapshot: &Path, log: &DiagnosticLog) {
    match files::copy_atomic(primary, snapshot) {
        Ok(()) => log.write(format!(
            "Backed up {} to {} ({} bytes)",
            primary.display(),
            snapshot.display(),
            file_len(snapshot)
        )),
        Err(e) => {
            warn!(error = %e, "failed to refresh settings backup snapshot");
            log.write(format!("Failed to back up {}: {}", primary.display(), e));
        }
    }
}

fn file_len(path: &Path) -> u64 {
    fs_err::metadata(path).map(|m| m.len()).unwrap_or(0)
}
