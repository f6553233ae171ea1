//! Window activity: wakes the window watcher when the frontmost app
//! switches away or changes its focused or main window.

use std::sync::Arc;

use modeglue_ax::{Accessibility, AxEvent, Notification, NotificationHandler};
use modeglue_context::WindowWaker;

use crate::observer::AppObserver;

pub const WINDOW_ACTIVITY_NOTIFICATIONS: &[Notification] = &[
    Notification::ApplicationActivated,
    Notification::ApplicationDeactivated,
    Notification::FocusedWindowChanged,
    Notification::MainWindowChanged,
];

/// Follows the frontmost application. Any of its notifications asks for an
/// immediate window read; a late one from a previous target only costs a
/// redundant read.
pub struct WindowActivitySource<A: Accessibility> {
    observer: AppObserver<A>,
}

impl<A: Accessibility> WindowActivitySource<A> {
    pub fn new(ax: Arc<A>, waker: WindowWaker) -> Self {
        let handler: NotificationHandler = Arc::new(move |event: AxEvent| {
            tracing::trace!(pid = event.pid, notification = ?event.notification, "window activity");
            waker.wake();
        });
        Self {
            observer: AppObserver::new(ax, handler, WINDOW_ACTIVITY_NOTIFICATIONS, false),
        }
    }

    /// Switch to `pid`. Returns whether the target changed.
    pub fn retarget(&mut self, pid: Option<i32>) -> bool {
        self.observer.retarget(pid)
    }

    pub fn target(&self) -> Option<i32> {
        self.observer.target()
    }

    pub fn stop(&mut self) {
        self.observer.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeglue_ax::MemoryAccessibility;
    use modeglue_context::{AppInfo, StaticProbe, WindowRules, WindowSnapshot, WindowWatcher};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[test]
    fn test_deactivation_wakes_watcher() {
        let probe = Arc::new(StaticProbe::new());
        probe.set_focused(Some(AppInfo::new(10, "com.apple.Safari", "Safari")));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let mut watcher = WindowWatcher::new();
        let ax = Arc::new(MemoryAccessibility::new());
        let mut source = WindowActivitySource::new(ax.clone(), watcher.waker());
        watcher.start_with_interval(
            Arc::clone(&probe),
            WindowRules::default(),
            Arc::new(move |snapshot: WindowSnapshot| {
                seen_clone
                    .lock()
                    .unwrap()
                    .push(snapshot.frontmost_name().to_string());
            }),
            Duration::from_secs(60),
        );

        assert!(source.retarget(Some(10)));
        std::thread::sleep(Duration::from_millis(50));
        probe.set_focused(Some(AppInfo::new(20, "com.apple.Notes", "Notes")));
        assert_eq!(ax.emit(10, Notification::ApplicationDeactivated), 1);

        let deadline = Instant::now() + Duration::from_secs(2);
        while seen.lock().unwrap().len() < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        watcher.stop();

        assert_eq!(seen.lock().unwrap().as_slice(), ["Safari", "Notes"]);
    }

    #[test]
    fn test_retarget_follows_frontmost() {
        let ax = Arc::new(MemoryAccessibility::new());
        let watcher = WindowWatcher::new();
        let mut source = WindowActivitySource::new(ax.clone(), watcher.waker());

        assert!(source.retarget(Some(10)));
        assert!(source.retarget(Some(20)));
        assert_eq!(ax.emit(10, Notification::MainWindowChanged), 0);
        assert_eq!(ax.emit(20, Notification::MainWindowChanged), 1);

        source.stop();
        assert_eq!(source.target(), None);
        assert_eq!(ax.live_subscriptions(), 0);
    }
}
