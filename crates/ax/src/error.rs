//! Error types for accessibility access.

use thiserror::Error;

/// Result type for accessibility operations.
pub type AxResult<T> = Result<T, AxError>;

/// Errors reported by the accessibility capability.
///
/// Queries in this crate never surface these to callers: they are logged and
/// turned into empty results. They are returned by the raw [`UiElement`]
/// methods so that the logging can say what went wrong.
///
/// [`UiElement`]: crate::UiElement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxError {
    /// The process is not trusted for accessibility.
    #[error("accessibility permission not granted - open System Settings > Privacy & Security > Accessibility")]
    PermissionDenied,

    /// The element no longer exists in the foreign process.
    #[error("element is no longer valid")]
    InvalidElement,

    /// The element does not expose the attribute or action.
    #[error("{0} is not supported by this element")]
    Unsupported(String),

    /// The foreign process did not answer in time or is busy.
    #[error("the application could not complete the request")]
    CannotComplete,

    /// The observer could not be created or registered.
    #[error("failed to register notification '{notification}': {message}")]
    Subscription {
        notification: String,
        message: String,
    },

    /// Any other error code returned by the platform.
    #[error("accessibility call failed with code {0}")]
    Platform(i32),
}

impl AxError {
    /// Whether this error means the element simply has nothing to offer, as
    /// opposed to a real access failure worth a warning.
    pub fn is_benign(&self) -> bool {
        matches!(self, AxError::Unsupported(_))
    }
}
