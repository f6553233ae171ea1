//! Synthetic input for modeglue.
//!
//! Posts the shortcuts that force the modal editor into a known mode, and
//! checks the accessibility permission both posting and tree access need.
//!
//! # Example
//!
//! ```ignore
//! use modeglue_input::{PlatformPoster, Shortcut, ShortcutPoster};
//!
//! let poster = PlatformPoster::new();
//! poster.post(&Shortcut::normal_mode())?;
//! ```

mod error;
mod shortcut;

#[cfg(target_os = "macos")]
mod macos;

use std::sync::Arc;

pub use error::{InputError, InputResult};
pub use shortcut::{Modifier, NullPoster, RecordingPoster, Shortcut, ShortcutPoster};

#[cfg(target_os = "macos")]
pub use macos::CGEventPoster;

/// Poster for the current platform.
#[cfg(target_os = "macos")]
pub type PlatformPoster = macos::CGEventPoster;

#[cfg(not(target_os = "macos"))]
pub type PlatformPoster = NullPoster;

/// Type alias for shared poster reference.
pub type ShortcutPosterRef = Arc<dyn ShortcutPoster>;

/// Check if the application has accessibility permissions.
///
/// On other platforms, always returns `true`.
pub fn has_accessibility_access() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::has_accessibility_access()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

/// Prompt the user to grant accessibility permissions.
///
/// On macOS, this opens the System Settings to the Accessibility pane.
/// On other platforms, this is a no-op.
pub fn prompt_accessibility_access() {
    #[cfg(target_os = "macos")]
    {
        macos::prompt_accessibility_access();
    }
}

/// Check if accessibility is granted, prompting if not.
///
/// Note: Even after prompting, this will return `false` until the user
/// actually grants permission and restarts the app.
pub fn ensure_accessibility_access() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::ensure_accessibility_access()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}
