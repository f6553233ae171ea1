//! Event contracts between signal sources and the event thread.
//!
//! Every signal source reports through a [`SourceEvent`]. The aggregator
//! consumes them on a single thread, so sources can run wherever their
//! platform mechanism requires.
//!
//! Also provides the `EventSink` trait for decoupled delivery.

mod bus;

pub use bus::{ChannelSink, EventSink, EventSinkRef, InMemorySink, NullSink};

use std::collections::HashMap;

use modeglue_ax::AxEvent;
use modeglue_context::{AppFamily, EditMode, Layer, WindowSnapshot};

/// Bundle id to family classification.
pub type FamilyMap = HashMap<String, AppFamily>;

/// An event delivered to the event thread.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// The editor's mode file was (re)read.
    ///
    /// Producers: edit-mode source
    EditModeChanged(EditMode),

    /// The editor's preferences were (re)read.
    ///
    /// Producers: family source
    FamiliesChanged(FamilyMap),

    /// The resolved hardware layer changed.
    ///
    /// Producers: layer listener
    LayerChanged(Layer),

    /// Frontmost app, overlay app, window identifier or overlay host changed.
    ///
    /// Producers: window watcher
    WindowChanged(WindowSnapshot),

    /// Focus or window notification from the frontmost application.
    ///
    /// Producers: focus source
    Accessibility(AxEvent),

    /// Window notification from the overlay provider.
    ///
    /// Producers: overlay source
    Overlay(AxEvent),

    /// Stop the event loop.
    ///
    /// Producers: signal handler
    Shutdown,
}

impl SourceEvent {
    /// Stable name, for logging and filtering.
    pub fn topic(&self) -> &'static str {
        match self {
            SourceEvent::EditModeChanged(_) => event_names::EDIT_MODE_CHANGED,
            SourceEvent::FamiliesChanged(_) => event_names::FAMILIES_CHANGED,
            SourceEvent::LayerChanged(_) => event_names::LAYER_CHANGED,
            SourceEvent::WindowChanged(_) => event_names::WINDOW_CHANGED,
            SourceEvent::Accessibility(_) => event_names::ACCESSIBILITY_CHANGED,
            SourceEvent::Overlay(_) => event_names::OVERLAY_NOTIFICATION,
            SourceEvent::Shutdown => event_names::SHUTDOWN,
        }
    }
}

/// Event names as constants to prevent typos.
pub mod event_names {
    pub const EDIT_MODE_CHANGED: &str = "edit_mode:changed";
    pub const FAMILIES_CHANGED: &str = "families:changed";
    pub const LAYER_CHANGED: &str = "layer:changed";
    pub const WINDOW_CHANGED: &str = "window:changed";
    pub const ACCESSIBILITY_CHANGED: &str = "ax:changed";
    pub const OVERLAY_NOTIFICATION: &str = "overlay:notification";
    pub const SHUTDOWN: &str = "loop:shutdown";
}
