//! Window watcher - background thread that re-reads window state when woken
//! by an accessibility notification, and on a fallback interval otherwise.

use crate::provider::WindowProbe;
use crate::window::{WindowRules, WindowSnapshot, WindowTracker};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default fallback interval between window reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Callback type for window change events.
pub type WindowCallback = Arc<dyn Fn(WindowSnapshot) + Send + Sync + 'static>;

/// Asks the watcher to read window state now. Wakes that arrive while a
/// read is already due are merged into it.
#[derive(Clone)]
pub struct WindowWaker {
    tx: Sender<()>,
}

impl WindowWaker {
    pub fn wake(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Background reader for frontmost app, overlay app and window identity.
pub struct WindowWatcher {
    running: Arc<AtomicBool>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl Default for WindowWatcher {
    fn default() -> Self {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        Self {
            running: Arc::new(AtomicBool::new(false)),
            wake_tx,
            wake_rx,
            handle: None,
        }
    }
}

impl WindowWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for triggering an immediate read. Valid before and after
    /// `start`.
    pub fn waker(&self) -> WindowWaker {
        WindowWaker {
            tx: self.wake_tx.clone(),
        }
    }

    /// Start watching with the given probe and callback.
    pub fn start<P>(&mut self, probe: Arc<P>, rules: WindowRules, callback: WindowCallback)
    where
        P: WindowProbe + ?Sized + 'static,
    {
        self.start_with_interval(probe, rules, callback, DEFAULT_POLL_INTERVAL);
    }

    /// Start watching with a custom fallback interval.
    pub fn start_with_interval<P>(
        &mut self,
        probe: Arc<P>,
        rules: WindowRules,
        callback: WindowCallback,
        interval: Duration,
    ) where
        P: WindowProbe + ?Sized + 'static,
    {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("WindowWatcher already running");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let wake = self.wake_rx.clone();

        let spawned = std::thread::Builder::new()
            .name("window-watcher".into())
            .spawn(move || {
                tracing::info!("WindowWatcher started with interval {:?}", interval);

                let mut tracker = WindowTracker::new(rules);

                while running.load(Ordering::SeqCst) {
                    if let Some(snapshot) = tracker.poll(probe.as_ref()) {
                        tracing::debug!(
                            frontmost = snapshot.frontmost_name(),
                            overlay = snapshot.overlay_name(),
                            window = %snapshot.window_identifier,
                            "window changed"
                        );
                        callback(snapshot);
                    }

                    match wake.recv_timeout(interval) {
                        Ok(()) => tracing::trace!("window read requested"),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                tracing::info!("WindowWatcher stopped");
            });

        match spawned {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn window watcher");
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Stop the watcher. No callback runs after this returns.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.wake_tx.try_send(());

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        while self.wake_rx.try_recv().is_ok() {}
    }

    /// Check if the watcher is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for WindowWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
