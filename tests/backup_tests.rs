//! Rotating backup history written after saves.

#![allow(clippy::unwrap_used)]

mod common;

use common::{count_files, settings_in};
use settings_store::{BackupWorker, MapProperties, Settings, Value, read_snapshot};

#[test]
fn history_keeps_ten_newest_files() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    settings.load().unwrap();

    for generation in 0..15i32 {
        settings.put("generation", generation);
        settings.save().unwrap();
        settings.flush_backups();
    }

    let files = settings.backup_files().unwrap();
    assert_eq!(files.len(), 10);
    assert_eq!(count_files(&settings.layout().backup_dir()), 10);

    let generations: Vec<i32> = files
        .iter()
        .map(|path| {
            read_snapshot(path)
                .unwrap()
                .get("generation")
                .and_then(Value::as_int)
                .unwrap()
        })
        .collect();
    assert_eq!(generations, (5..15).rev().collect::<Vec<_>>());
}

#[test]
fn custom_cap_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::builder()
        .data_dir(dir.path())
        .max_backups(3)
        .properties(MapProperties::new())
        .build()
        .unwrap();
    settings.load().unwrap();

    for i in 0..6i32 {
        settings.put("i", i);
        settings.save().unwrap();
    }
    settings.flush_backups();

    assert_eq!(settings.backup_files().unwrap().len(), 3);
}

#[test]
fn shared_worker_serves_several_stores() {
    let worker = BackupWorker::spawn().unwrap();
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();

    let open = |dir: &std::path::Path| {
        Settings::builder()
            .data_dir(dir)
            .worker(worker.clone())
            .properties(MapProperties::new())
            .build()
            .unwrap()
    };
    let first = open(first_dir.path());
    let second = open(second_dir.path());

    for settings in [&first, &second] {
        settings.load().unwrap();
        settings.put("x", true);
        settings.save().unwrap();
    }
    worker.flush();

    assert_eq!(first.backup_files().unwrap().len(), 1);
    assert_eq!(second.backup_files().unwrap().len(), 1);
}

#[test]
fn save_before_load_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());

    settings.put("x", 1i32);
    settings.save().unwrap();
    settings.flush_backups();

    assert!(!settings.layout().primary().exists());
    assert!(settings.backup_files().unwrap().is_empty());
}

#[test]
fn leftover_temporary_files_do_not_count_as_history() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::builder()
        .data_dir(dir.path())
        .max_backups(2)
        .properties(MapProperties::new())
        .build()
        .unwrap();
    let backup_dir = settings.layout().backup_dir();
    std::fs::create_dir_all(&backup_dir).unwrap();
    std::fs::write(backup_dir.join("1700000000000.bin.tmp"), b"partial").unwrap();
    std::fs::write(backup_dir.join(".tmpQx81Za"), b"partial").unwrap();

    settings.load().unwrap();
    for i in 0..3i32 {
        settings.put("i", i);
        settings.save().unwrap();
        settings.flush_backups();
    }

    let files = settings.backup_files().unwrap();
    assert_eq!(files.len(), 2);
    assert!(
        files
            .iter()
            .all(|path| path.extension().is_some_and(|ext| ext == "bin"))
    );
}
