//! Single-file watcher.
//!
//! Watches the file's parent directory rather than the file itself, so a
//! file that is deleted and recreated (atomic saves, preference rewrites)
//! keeps being reported without resubscribing.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SourceError, SourceResult};

/// Callback for file change events.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync + 'static>;

const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Watches one file and calls back on every create, write or removal.
pub struct FileWatcher {
    path: PathBuf,
    running: Arc<AtomicBool>,
    /// The watcher instance (kept alive).
    watcher: Option<RecommendedWatcher>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FileWatcher {
    pub fn watch<F>(path: impl Into<PathBuf>, callback: F) -> SourceResult<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let path = path.into();
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| SourceError::NoParent { path: path.clone() })?
            .to_path_buf();
        let file_name = path
            .file_name()
            .ok_or_else(|| SourceError::NoParent { path: path.clone() })?
            .to_os_string();

        if !path.exists() {
            warn!(path = %path.display(), "watched file does not exist yet");
        }

        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                // Fails only once the event thread has stopped.
                let _ = tx.send(result);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(SourceError::WatcherCreation)?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|source| SourceError::WatchPath {
                path: directory.clone(),
                source,
            })?;

        info!(path = %path.display(), "watching file");

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let callback: ChangeCallback = Arc::new(callback);

        let handle = thread::Builder::new()
            .name("file-watcher".into())
            .spawn(move || Self::event_loop(rx, file_name, thread_running, callback))
            .map_err(|source| SourceError::Thread {
                name: "file-watcher",
                source,
            })?;

        Ok(Self {
            path,
            running,
            watcher: Some(watcher),
            handle: Some(handle),
        })
    }

    fn event_loop(
        rx: mpsc::Receiver<Result<Event, notify::Error>>,
        file_name: OsString,
        running: Arc<AtomicBool>,
        callback: ChangeCallback,
    ) {
        while running.load(Ordering::SeqCst) {
            match rx.recv_timeout(RECV_TIMEOUT) {
                Ok(Ok(event)) => {
                    let relevant = matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) && event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));

                    if relevant && running.load(Ordering::SeqCst) {
                        debug!(kind = ?event.kind, "watched file changed");
                        callback();
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "file watcher error");
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    debug!("watcher channel closed");
                    break;
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop watching. No callback runs after this returns.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.watcher.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("path", &self.path)
            .finish()
    }
}
