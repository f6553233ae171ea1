//! Focus source: focused element and modal state of the frontmost app.

use std::sync::Arc;

use modeglue_ax::{find_modal, Accessibility, ElementExt, Notification, SubscriptionId, UiElement};
use modeglue_events::{EventSinkRef, SourceEvent};

use crate::observer::{forward_to, AppObserver};

/// Observed on the application and on each window that exists when
/// observation starts.
pub const FOCUS_NOTIFICATIONS: &[Notification] = &[
    Notification::WindowCreated,
    Notification::FocusedElementChanged,
    Notification::ApplicationActivated,
    Notification::ApplicationDeactivated,
    Notification::ElementDestroyed,
];

/// The four values derived after every accessibility change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusSnapshot {
    pub modal_role: String,
    pub focused_role: String,
    pub focused_subrole: String,
    pub focused_placeholder: String,
}

impl FocusSnapshot {
    /// Read the snapshot from an application element.
    pub fn capture<E: UiElement>(app: &E, modal_depth: usize) -> Self {
        let modal_role = find_modal(app, modal_depth)
            .map(|modal| modal.role())
            .unwrap_or_default();

        match app.focused() {
            Some(focused) => Self {
                modal_role,
                focused_role: focused.role(),
                focused_subrole: focused.subrole(),
                focused_placeholder: focused.placeholder(),
            },
            None => Self {
                modal_role,
                ..Self::default()
            },
        }
    }
}

/// Follows the frontmost application.
pub struct FocusSource<A: Accessibility> {
    observer: AppObserver<A>,
}

impl<A: Accessibility> FocusSource<A> {
    pub fn new(ax: Arc<A>, sink: EventSinkRef) -> Self {
        Self {
            observer: AppObserver::new(
                ax,
                forward_to(sink, SourceEvent::Accessibility),
                FOCUS_NOTIFICATIONS,
                true,
            ),
        }
    }

    /// Switch to `pid`. Returns whether the target changed.
    pub fn retarget(&mut self, pid: Option<i32>) -> bool {
        self.observer.retarget(pid)
    }

    pub fn target(&self) -> Option<i32> {
        self.observer.target()
    }

    pub fn is_current(&self, id: SubscriptionId) -> bool {
        self.observer.is_current(id)
    }

    pub fn stop(&mut self) {
        self.observer.stop();
    }
}
