//! Error types for input emulation.

use thiserror::Error;

/// Result type for input emulation.
pub type InputResult<T> = Result<T, InputError>;

/// Errors that can occur during input emulation.
#[derive(Debug, Error)]
pub enum InputError {
    /// Accessibility permission not granted (macOS).
    #[error("accessibility permission not granted - open System Settings > Privacy & Security > Accessibility")]
    AccessibilityNotGranted,

    /// Failed to create the event source.
    #[error("failed to create keyboard event source")]
    EventSource,

    /// Failed to simulate key press.
    #[error("failed to simulate key {0}")]
    KeyFailed(u16),

    /// No way to post events on this platform.
    #[error("synthetic input is not supported on this platform")]
    Unsupported,
}
