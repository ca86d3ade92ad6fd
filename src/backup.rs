//! Rotating backup history.
//!
//! Each successful save enqueues a rotation job on a single background thread.
//! The job copies the primary file into the history folder under a
//! millisecond timestamp name and prunes the oldest copies beyond the cap.
//! Jobs run one at a time in submission order, and each one takes the store's
//! lock before touching any file, so it never sees a half-written primary.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::diagnostics::DiagnosticLog;
use crate::error::{Result, SettingsError};
use crate::files;
use crate::layout::Layout;
use crate::logging::{debug, trace, warn};

/// Default number of files kept in the backup history.
pub const DEFAULT_MAX_BACKUPS: usize = 10;

enum Job {
    Run(Box<dyn FnOnce() + Send>),
    Barrier(Sender<()>),
}

/// Handle to the single background thread that runs backup jobs.
///
/// Cloning the handle shares the thread. The thread exits once every handle
/// has been dropped and the queued jobs have run.
#[derive(Debug, Clone)]
pub struct BackupWorker {
    sender: Sender<Job>,
}

impl BackupWorker {
    /// Start the worker thread.
    pub fn spawn() -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();

        thread::Builder::new()
            .name("settings-backup".to_string())
            .spawn(move || {
                for job in receiver {
                    match job {
                        Job::Run(run) => run(),
                        Job::Barrier(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                trace!("settings backup worker stopped");
            })
            .map_err(SettingsError::Worker)?;

        Ok(Self { sender })
    }

    /// Queue a job. Returns `false` if the worker thread is gone.
    pub(crate) fn submit(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.sender.send(Job::Run(Box::new(job))).is_ok()
    }

    /// Block until every job submitted before this call has finished.
    ///
    /// Must not be called while holding a lock that queued jobs acquire.
    pub fn flush(&self) {
        let (done, wait) = mpsc::channel();
        if self.sender.send(Job::Barrier(done)).is_ok() {
            let _ = wait.recv();
        }
    }
}

/// Schedules rotation of the backup history after saves.
#[derive(Debug, Clone)]
pub(crate) struct BackupManager {
    worker: BackupWorker,
    primary: PathBuf,
    backup_dir: PathBuf,
    max_backups: usize,
    log: DiagnosticLog,
}

impl BackupManager {
    pub(crate) fn new(worker: BackupWorker, layout: &Layout, max_backups: usize) -> Self {
        Self {
            worker,
            primary: layout.primary(),
            backup_dir: layout.backup_dir(),
            max_backups: max_backups.max(1),
            log: DiagnosticLog::new(layout.log_file()),
        }
    }

    pub(crate) fn worker(&self) -> &BackupWorker {
        &self.worker
    }

    /// Enqueue a rotation that runs while holding `lock`.
    pub(crate) fn enqueue<T: Send + 'static>(&self, lock: Arc<Mutex<T>>) {
        let manager = self.clone();
        let submitted = self.worker.submit(move || {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            match rotate(&manager.primary, &manager.backup_dir, manager.max_backups) {
                Ok(_path) => {
                    debug!(path = %_path.display(), "settings backup written");
                }
                Err(e) => {
                    warn!(error = %e, "settings backup rotation failed");
                    manager.log.write(format!("Backup rotation failed: {}", e));
                }
            }
        });

        if !submitted {
            self.log
                .write("Backup worker is not running; skipped backup rotation");
        }
    }
}

/// Copy `primary` into `backup_dir` and prune the history to `max_backups`
/// files. Returns the path of the new backup.
pub(crate) fn rotate(primary: &Path, backup_dir: &Path, max_backups: usize) -> Result<PathBuf> {
    let mut previous = files::files_newest_first(backup_dir)?;

    let target = next_backup_path(backup_dir);
    files::copy_atomic(primary, &target)?;

    while previous.len() >= max_backups.max(1) {
        let Some(oldest) = previous.pop() else {
            break;
        };
        if let Err(_e) = fs_err::remove_file(&oldest) {
            warn!(path = %oldest.display(), error = %_e, "failed to prune settings backup");
        }
    }

    Ok(target)
}

/// `<epoch-millis>.bin`, bumped to the next free millisecond if taken.
fn next_backup_path(backup_dir: &Path) -> PathBuf {
    let mut millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    loop {
        let candidate = backup_dir.join(format!("{}.{}", millis, files::SNAPSHOT_EXTENSION));
        if !candidate.exists() {
            return candidate;
        }
        millis += 1;
    }
}
