//! Signal sources for modeglue.
//!
//! Every source reports through an [`EventSink`](modeglue_events::EventSink)
//! and never touches aggregator state:
//! - `edit_mode` - the modal editor's state file
//! - `families` - the modal editor's per-app preference lists
//! - `layer` - hardware layer on/off signals over a control socket
//! - `focus` - focused element and modal state of the frontmost app
//! - `overlay` - overlay provider dialogs
//! - `window_activity` - wakes the window watcher on app and window switches

mod edit_mode;
mod error;
mod families;
mod file_watcher;
mod focus;
mod layer;
mod observer;
mod overlay;
mod window_activity;

pub use edit_mode::{read_edit_mode, EditModeSource, DEFAULT_EDIT_MODE_FILE};
pub use error::{SourceError, SourceResult};
pub use families::{default_family_lists, read_families, FamilySource, DEFAULT_PREFERENCES_FILE};
pub use file_watcher::{ChangeCallback, FileWatcher};
pub use focus::{FocusSnapshot, FocusSource, FOCUS_NOTIFICATIONS};
pub use layer::{parse_signal, LayerListener, LayerTracker};
pub use observer::{forward_to, AppObserver, EventWrapper};
pub use overlay::{
    OverlayChange, OverlaySource, OverlayTracker, DEFAULT_OVERLAY_BUNDLE_ID, OVERLAY_NOTIFICATIONS,
};
pub use window_activity::{WindowActivitySource, WINDOW_ACTIVITY_NOTIFICATIONS};
