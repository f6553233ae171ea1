//! One notification subscription that follows a target process.

use std::sync::Arc;

use modeglue_ax::{
    Accessibility, AxError, AxEvent, Notification, NotificationHandler, Subscription,
    SubscriptionId,
};
use modeglue_events::{EventSinkRef, SourceEvent};

/// Wraps a raw notification into the event the source reports.
pub type EventWrapper = fn(AxEvent) -> SourceEvent;

/// Handler that wraps each notification and sends it to `sink`.
pub fn forward_to(sink: EventSinkRef, wrap: EventWrapper) -> NotificationHandler {
    Arc::new(move |event: AxEvent| sink.send(wrap(event)))
}

/// Keeps at most one subscription alive and swaps it when the target
/// process changes.
pub struct AppObserver<A: Accessibility> {
    ax: Arc<A>,
    handler: NotificationHandler,
    notifications: Vec<Notification>,
    include_windows: bool,
    current: Option<(i32, SubscriptionId)>,
}

impl<A: Accessibility> AppObserver<A> {
    pub fn new(
        ax: Arc<A>,
        handler: NotificationHandler,
        notifications: &[Notification],
        include_windows: bool,
    ) -> Self {
        Self {
            ax,
            handler,
            notifications: notifications.to_vec(),
            include_windows,
            current: None,
        }
    }

    pub fn target(&self) -> Option<i32> {
        self.current.map(|(pid, _)| pid)
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.current.map(|(_, id)| id)
    }

    /// Whether `id` is the live subscription. Events from any other id are
    /// stale.
    pub fn is_current(&self, id: SubscriptionId) -> bool {
        self.subscription() == Some(id)
    }

    /// Observe `pid` instead of the current target. Returns whether the
    /// target changed.
    pub fn retarget(&mut self, pid: Option<i32>) -> bool {
        if self.target() == pid {
            return false;
        }

        self.stop();

        let Some(pid) = pid else {
            return true;
        };

        let mut subscription = Subscription::new(pid, &self.notifications);
        if self.include_windows {
            subscription = subscription.with_windows();
        }

        match self.ax.subscribe(&subscription, Arc::clone(&self.handler)) {
            Ok(id) => {
                tracing::debug!(pid, subscription = %id, "observing application");
                self.current = Some((pid, id));
            }
            Err(AxError::PermissionDenied) => {
                tracing::warn!(pid, "accessibility permission denied, not observing");
            }
            Err(e) => {
                tracing::debug!(pid, error = %e, "failed to observe application");
            }
        }
        true
    }

    /// Drop the subscription. No new notification is delivered for it after
    /// this returns.
    pub fn stop(&mut self) {
        if let Some((pid, id)) = self.current.take() {
            self.ax.unsubscribe(id);
            tracing::trace!(pid, subscription = %id, "stopped observing application");
        }
    }
}

impl<A: Accessibility> Drop for AppObserver<A> {
    fn drop(&mut self) {
        self.stop();
    }
}
