//! Small filesystem helpers shared by recovery and backup rotation.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;

use crate::error::{Result, SettingsError};

/// Extension of every snapshot file kept in the backup history.
pub(crate) const SNAPSHOT_EXTENSION: &str = "bin";

/// Write `bytes` to a temporary file next to `to`, sync it, then rename it
/// over `to`. On failure the temporary file is removed and `to` is untouched.
pub(crate) fn write_atomic(to: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match to.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs_err::create_dir_all(parent).map_err(|e| SettingsError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| SettingsError::io(parent, e))?;
    tmp.write_all(bytes).map_err(|e| SettingsError::io(to, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| SettingsError::io(to, at_path(e, tmp.path())))?;
    tmp.persist(to)
        .map_err(|e| SettingsError::io(to, at_path(e.error, to)))?;
    Ok(())
}

/// Copy `from` to `to` so that `to` holds either its old content or the
/// complete new content.
pub(crate) fn copy_atomic(from: &Path, to: &Path) -> Result<()> {
    let bytes = fs_err::read(from).map_err(|e| SettingsError::io(from, e))?;
    write_atomic(to, &bytes)
}

/// Attach `path` to errors from operations that do not name it themselves.
fn at_path(e: io::Error, path: &Path) -> io::Error {
    io::Error::new(e.kind(), format!("{} at path {}", e, path.display()))
}

/// Snapshot files directly inside `dir`, most recently modified first.
///
/// Files sharing a modification time are ordered by name, highest first, which
/// for `<epoch-millis>.bin` names is again newest first. A missing directory
/// yields an empty list.
pub(crate) fn files_newest_first(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = list_files(dir)?;
    sort_newest_first(&mut files);
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Snapshot files (`*.bin`) directly inside `dir` with their modification
/// times, in directory order. Anything else, such as a temporary file left by
/// an interrupted copy, is ignored.
pub(crate) fn list_files(dir: &Path) -> Result<Vec<(SystemTime, PathBuf)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs_err::read_dir(dir).map_err(|e| SettingsError::io(dir, e))? {
        let entry = entry.map_err(|e| SettingsError::io(dir, e))?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| SettingsError::io(&path, e))?;
        let is_snapshot = path
            .extension()
            .is_some_and(|ext| ext == SNAPSHOT_EXTENSION);
        if !metadata.is_file() || !is_snapshot {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, path));
    }
    Ok(files)
}

/// Sort `(modified, path)` pairs newest first, ties broken by file name.
pub(crate) fn sort_newest_first(files: &mut [(SystemTime, PathBuf)]) {
    files.sort_by(|(a_time, a_path), (b_time, b_path)| {
        b_time
            .cmp(a_time)
            .then_with(|| b_path.file_name().cmp(&a_path.file_name()))
    });
}

pub(crate) fn modified_time(path: &Path) -> Option<SystemTime> {
    fs_err::metadata(path).ok()?.modified().ok()
}
