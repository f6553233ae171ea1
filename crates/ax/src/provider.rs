//! The accessibility capability as a whole: application roots, trust and
//! notification subscriptions.

use std::sync::Arc;

use crate::attribute::Notification;
use crate::element::UiElement;
use crate::error::AxResult;
use crate::registry::SubscriptionId;

/// A notification delivered to a subscriber.
///
/// Carries the subscription it was raised for so the receiver can discard
/// notifications from a subscription it has already torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxEvent {
    pub subscription: SubscriptionId,
    pub pid: i32,
    pub notification: Notification,
}

/// Called on whatever thread the platform raises notifications on. Handlers
/// must only forward the event, never touch shared state directly.
pub type NotificationHandler = Arc<dyn Fn(AxEvent) + Send + Sync + 'static>;

/// What to observe in one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub pid: i32,
    pub notifications: Vec<Notification>,
    /// Also register the notifications on every window that exists now.
    pub include_windows: bool,
}

impl Subscription {
    pub fn new(pid: i32, notifications: &[Notification]) -> Self {
        Self {
            pid,
            notifications: notifications.to_vec(),
            include_windows: false,
        }
    }

    pub fn with_windows(mut self) -> Self {
        self.include_windows = true;
        self
    }
}

/// Access to other processes' UI trees.
pub trait Accessibility: Send + Sync + 'static {
    type Element: UiElement;

    /// Whether this process may use the accessibility API at all.
    fn is_trusted(&self) -> bool;

    /// Root element of the application with process id `pid`.
    fn application(&self, pid: i32) -> Option<Self::Element>;

    /// Application that currently receives keyboard input, including
    /// non-activating panels such as launchers.
    fn focused_application(&self) -> Option<Self::Element>;

    /// Start delivering notifications to `handler`.
    fn subscribe(
        &self,
        subscription: &Subscription,
        handler: NotificationHandler,
    ) -> AxResult<SubscriptionId>;

    /// Stop delivery. Once this returns no new delivery for `id` starts;
    /// one already in progress may still complete.
    fn unsubscribe(&self, id: SubscriptionId);
}
