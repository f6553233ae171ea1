//! Frontmost app, overlay app and window identity derivation.

use crate::app::AppInfo;
use crate::provider::WindowProbe;

/// Which applications count as frontmost or overlay candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowRules {
    /// Localized names never considered frontmost.
    pub excluded_apps: Vec<String>,
    /// Localized names considered overlay apps when focused.
    pub overlay_apps: Vec<String>,
    /// Bundle id of the overlay provider whose dialogs are tracked.
    pub overlay_bundle_id: String,
}

impl WindowRules {
    fn is_excluded(&self, app: &AppInfo) -> bool {
        app.is_background_process() || self.excluded_apps.iter().any(|name| *name == app.name)
    }

    fn is_overlay(&self, app: &AppInfo) -> bool {
        self.overlay_apps.iter().any(|name| *name == app.name)
    }
}

/// What the user is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub frontmost: Option<AppInfo>,
    pub overlay: Option<AppInfo>,
    pub window_identifier: String,
    /// Running instance of the overlay provider, focused or not.
    pub overlay_host: Option<AppInfo>,
}

impl WindowSnapshot {
    pub fn frontmost_name(&self) -> &str {
        self.frontmost.as_ref().map_or("", |app| app.name.as_str())
    }

    pub fn overlay_name(&self) -> &str {
        self.overlay.as_ref().map_or("", |app| app.name.as_str())
    }

    pub fn frontmost_pid(&self) -> Option<i32> {
        self.frontmost.as_ref().map(|app| app.pid)
    }

    pub fn overlay_host_pid(&self) -> Option<i32> {
        self.overlay_host.as_ref().map(|app| app.pid)
    }

    fn differs_from(&self, other: &WindowSnapshot) -> bool {
        self.frontmost_pid() != other.frontmost_pid()
            || self.overlay.as_ref().map(|a| a.pid) != other.overlay.as_ref().map(|a| a.pid)
            || self.window_identifier != other.window_identifier
            || self.overlay_host_pid() != other.overlay_host_pid()
    }
}

/// Derives [`WindowSnapshot`]s and reports when they change.
#[derive(Debug, Default)]
pub struct WindowTracker {
    rules: WindowRules,
    last: Option<WindowSnapshot>,
}

impl WindowTracker {
    pub fn new(rules: WindowRules) -> Self {
        Self { rules, last: None }
    }

    /// Read the probe once.
    ///
    /// The frontmost app is the accessibility-focused app (catches launchers
    /// and panels), falling back to the workspace frontmost app (catches the
    /// app underneath an overlay).
    pub fn derive<P: WindowProbe + ?Sized>(&self, probe: &P) -> WindowSnapshot {
        let focused = probe.focused_app();

        let frontmost = focused
            .clone()
            .filter(|app| !self.rules.is_excluded(app))
            .or_else(|| probe.frontmost_app().filter(|app| !self.rules.is_excluded(app)));

        let overlay = focused.filter(|app| self.rules.is_overlay(app));

        let window_identifier = frontmost
            .as_ref()
            .map(|app| probe.first_window_identifier(app.pid))
            .unwrap_or_default();

        let overlay_host = if self.rules.overlay_bundle_id.is_empty() {
            None
        } else {
            probe.running_app(&self.rules.overlay_bundle_id)
        };

        WindowSnapshot {
            frontmost,
            overlay,
            window_identifier,
            overlay_host,
        }
    }

    /// Record `snapshot`; returns it back if it differs from the last one.
    /// The first snapshot always counts as a change.
    pub fn update(&mut self, snapshot: WindowSnapshot) -> Option<WindowSnapshot> {
        let changed = match &self.last {
            None => true,
            Some(last) => snapshot.differs_from(last),
        };

        if !changed {
            return None;
        }

        self.last = Some(snapshot.clone());
        Some(snapshot)
    }

    pub fn poll<P: WindowProbe + ?Sized>(&mut self, probe: &P) -> Option<WindowSnapshot> {
        let snapshot = self.derive(probe);
        self.update(snapshot)
    }

    pub fn last(&self) -> Option<&WindowSnapshot> {
        self.last.as_ref()
    }
}
