//! Provider traits for window and application detection.
//!
//! These traits abstract platform-specific implementations,
//! allowing the derivation logic to remain pure and testable.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::app::AppInfo;

/// Read-only view of the desktop's application and window state.
pub trait WindowProbe: Send + Sync {
    /// Application receiving keyboard input according to accessibility.
    /// Includes non-activating panels such as launchers and overlays.
    fn focused_app(&self) -> Option<AppInfo>;

    /// Workspace frontmost (activated) application.
    fn frontmost_app(&self) -> Option<AppInfo>;

    /// `AXIdentifier` of the first window of `pid`, empty if none.
    fn first_window_identifier(&self, pid: i32) -> String;

    /// First running application with `bundle_id`.
    fn running_app(&self, bundle_id: &str) -> Option<AppInfo>;
}

/// Null implementation for unsupported platforms.
pub struct NullProbe;

impl WindowProbe for NullProbe {
    fn focused_app(&self) -> Option<AppInfo> {
        None
    }

    fn frontmost_app(&self) -> Option<AppInfo> {
        None
    }

    fn first_window_identifier(&self, _pid: i32) -> String {
        String::new()
    }

    fn running_app(&self, _bundle_id: &str) -> Option<AppInfo> {
        None
    }
}

/// Probe whose answers are set by hand.
#[derive(Default)]
pub struct StaticProbe {
    focused: Mutex<Option<AppInfo>>,
    frontmost: Mutex<Option<AppInfo>>,
    windows: Mutex<HashMap<i32, String>>,
    running: Mutex<Vec<AppInfo>>,
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_focused(&self, app: Option<AppInfo>) {
        *self.focused.lock().unwrap() = app;
    }

    pub fn set_frontmost(&self, app: Option<AppInfo>) {
        *self.frontmost.lock().unwrap() = app;
    }

    pub fn set_window_identifier(&self, pid: i32, identifier: &str) {
        self.windows
            .lock()
            .unwrap()
            .insert(pid, identifier.to_string());
    }

    pub fn set_running(&self, apps: Vec<AppInfo>) {
        *self.running.lock().unwrap() = apps;
    }
}

impl WindowProbe for StaticProbe {
    fn focused_app(&self) -> Option<AppInfo> {
        self.focused.lock().unwrap().clone()
    }

    fn frontmost_app(&self) -> Option<AppInfo> {
        self.frontmost.lock().unwrap().clone()
    }

    fn first_window_identifier(&self, pid: i32) -> String {
        self.windows
            .lock()
            .unwrap()
            .get(&pid)
            .cloned()
            .unwrap_or_default()
    }

    fn running_app(&self, bundle_id: &str) -> Option<AppInfo> {
        self.running
            .lock()
            .unwrap()
            .iter()
            .find(|app| app.bundle_id == bundle_id)
            .cloned()
    }
}
