//! Overlay source: dialogs shown by the overlay provider.
//!
//! The provider exposes almost nothing through accessibility. Its overlays
//! are system-dialog children of the application element; a dialog with
//! children is the scroll overlay, a childless one the search overlay.

use std::sync::Arc;

use modeglue_ax::{roles, Accessibility, ElementExt, Notification, SubscriptionId, UiElement};
use modeglue_context::OverlayKind;
use modeglue_events::{EventSinkRef, SourceEvent};

use crate::observer::{forward_to, AppObserver};

pub const DEFAULT_OVERLAY_BUNDLE_ID: &str = "com.superultra.Homerow";

pub const OVERLAY_NOTIFICATIONS: &[Notification] =
    &[Notification::ElementDestroyed, Notification::WindowCreated];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayChange {
    Appeared(OverlayKind),
    Changed(OverlayKind),
    Disappeared,
}

/// Turns provider notifications into appear / change / disappear.
#[derive(Debug, Default)]
pub struct OverlayTracker {
    dialogs: usize,
}

impl OverlayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialogs(&self) -> usize {
        self.dialogs
    }

    /// Provider restarted or went away.
    pub fn reset(&mut self) {
        self.dialogs = 0;
    }

    /// Re-count the provider's dialogs after `notification`.
    pub fn observe<E: UiElement>(
        &mut self,
        app: &E,
        notification: Notification,
    ) -> Option<OverlayChange> {
        let dialogs: Vec<E> = app
            .child_elements()
            .into_iter()
            .filter(|child| child.subrole() == roles::SYSTEM_DIALOG)
            .collect();
        let previous = std::mem::replace(&mut self.dialogs, dialogs.len());

        match notification {
            Notification::WindowCreated => {
                let newest = dialogs.last()?;
                let kind = if newest.child_elements().is_empty() {
                    OverlayKind::Search
                } else {
                    OverlayKind::Scroll
                };
                if previous == 0 {
                    Some(OverlayChange::Appeared(kind))
                } else {
                    Some(OverlayChange::Changed(kind))
                }
            }
            Notification::ElementDestroyed if dialogs.is_empty() && previous > 0 => {
                Some(OverlayChange::Disappeared)
            }
            _ => None,
        }
    }
}

/// Follows the running overlay provider, focused or not.
pub struct OverlaySource<A: Accessibility> {
    observer: AppObserver<A>,
}

impl<A: Accessibility> OverlaySource<A> {
    pub fn new(ax: Arc<A>, sink: EventSinkRef) -> Self {
        Self {
            observer: AppObserver::new(
                ax,
                forward_to(sink, SourceEvent::Overlay),
                OVERLAY_NOTIFICATIONS,
                false,
            ),
        }
    }

    /// Attach to the provider process, or detach with `None`. Returns
    /// whether the target changed.
    pub fn attach(&mut self, pid: Option<i32>) -> bool {
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

#[cfg(test)]
mod tests {
    use super::*;
    use modeglue_ax::{Attribute, MemoryElement};

    fn provider() -> MemoryElement {
        MemoryElement::new(roles::APPLICATION)
    }

    fn dialog() -> MemoryElement {
        MemoryElement::new(roles::WINDOW).with(Attribute::Subrole, roles::SYSTEM_DIALOG)
    }

    #[test]
    fn test_scroll_then_search_then_gone() {
        let app = provider();
        let mut tracker = OverlayTracker::new();

        let scroll = app.add_child(dialog());
        scroll.add_child(MemoryElement::new("AXGroup"));
        assert_eq!(
            tracker.observe(&app, Notification::WindowCreated),
            Some(OverlayChange::Appeared(OverlayKind::Scroll))
        );

        app.add_child(dialog());
        assert_eq!(
            tracker.observe(&app, Notification::WindowCreated),
            Some(OverlayChange::Changed(OverlayKind::Search))
        );

        app.clear_children();
        assert_eq!(
            tracker.observe(&app, Notification::ElementDestroyed),
            Some(OverlayChange::Disappeared)
        );
        assert_eq!(tracker.dialogs(), 0);
    }

    #[test]
    fn test_destroy_without_dialogs_is_quiet() {
        let app = provider();
        let mut tracker = OverlayTracker::new();
        assert_eq!(tracker.observe(&app, Notification::ElementDestroyed), None);
    }

    #[test]
    fn test_destroy_with_dialogs_left_is_quiet() {
        let app = provider();
        let mut tracker = OverlayTracker::new();
        app.add_child(dialog());
        app.add_child(dialog());
        tracker.observe(&app, Notification::WindowCreated);

        app.clear_children();
        app.add_child(dialog());
        assert_eq!(tracker.observe(&app, Notification::ElementDestroyed), None);
        assert_eq!(tracker.dialogs(), 1);
    }

    #[test]
    fn test_non_dialog_window_is_ignored() {
        let app = provider();
        let mut tracker = OverlayTracker::new();
        app.add_child(MemoryElement::new(roles::WINDOW));
        assert_eq!(tracker.observe(&app, Notification::WindowCreated), None);
    }
}
