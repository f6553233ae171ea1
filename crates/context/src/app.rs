//! Running application identity.

use serde::{Deserialize, Serialize};

/// Information about a running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub pid: i32,
    /// Bundle identifier (e.g., "com.apple.Safari"). Empty if the process has none.
    pub bundle_id: String,
    /// Localized name (e.g., "Safari").
    pub name: String,
}

impl AppInfo {
    pub fn new(pid: i32, bundle_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pid,
            bundle_id: bundle_id.into(),
            name: name.into(),
        }
    }

    /// Processes the user never interacts with directly.
    pub fn is_background_process(&self) -> bool {
        is_background_bundle(&self.bundle_id)
    }
}

/// Bundle ids that never own a user-facing window.
pub const BACKGROUND_BUNDLE_IDS: &[&str] = &[
    "org.pqrs.Karabiner-AXNotifier",
    "com.adobe.PDApp.AAMUpdatesNotifier",
    "com.apple.loginwindow",
    "com.apple.WindowManager",
    "com.apple.universalcontrol",
];

/// Helpers, agents, WebKit content processes and the Dock.
///
/// A name containing "helper" or "agent" is enough; an app actually named
/// that way is misclassified.
pub fn is_background_bundle(bundle_id: &str) -> bool {
    if bundle_id.is_empty() {
        return false;
    }

    let lower = bundle_id.to_lowercase();

    BACKGROUND_BUNDLE_IDS.contains(&bundle_id)
        || bundle_id.starts_with("com.apple.WebKit.")
        || bundle_id.starts_with("com.apple.dock")
        || lower.contains("helper")
        || lower.contains("agent")
}
