//! Common test utilities and fixtures.
//!
//! Helpers to build a settings store in a temporary directory and to lay out
//! snapshot files on disk with controlled modification times.

#![allow(dead_code, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use settings_store::{Layout, MapProperties, Settings, Store, Value, encode};

/// Settings rooted at `dir` that ignore the process environment.
pub fn settings_in(dir: &Path) -> Settings {
    Settings::builder()
        .data_dir(dir)
        .properties(MapProperties::new())
        .build()
        .unwrap()
}

pub fn store_of<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Store {
    entries.into_iter().collect()
}

/// Encode `store` and write it to `path`, creating parent directories.
pub fn write_snapshot(path: &Path, store: &Store) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, encode(store).unwrap()).unwrap();
}

/// Write bytes that can never decode as a snapshot.
pub fn write_garbage(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"\xff\xff\xff\xffnot a settings file").unwrap();
}

/// Set the modification time of `path` to `secs_ago` seconds in the past.
pub fn age(path: &Path, secs_ago: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
        .unwrap();
}

/// Path of a history file in the backup directory.
pub fn history_file(layout: &Layout, name: &str) -> PathBuf {
    layout.backup_dir().join(name)
}

pub fn count_files(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(Result::ok).count(),
        Err(_) => 0,
    }
}
