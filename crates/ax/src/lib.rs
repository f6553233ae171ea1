//! Accessibility tree access for modeglue.
//!
//! Reads other applications' UI trees, finds elements in them and acts on
//! them, and delivers accessibility notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  element.rs  - UiElement trait and lenient getters           │
//! │  selector.rs - Selector matching and pruned tree search      │
//! │  query.rs    - Ancestors, menu paths, modal lookup           │
//! │  actions.rs  - Press / focus / select / menu commands        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  provider.rs       - Accessibility capability trait          │
//! │  registry.rs       - Subscription id -> handler table        │
//! │  platform/macos.rs - AXUIElement / AXObserver implementation │
//! │  memory.rs         - In-memory tree for tests                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use modeglue_ax::{act_on, Accessibility, ElementAction, Selector};
//! use modeglue_ax::platform;
//!
//! let ax = platform::open()?;
//! if let Some(app) = ax.focused_application() {
//!     let field = Selector::new().role("AXTextField").within(["AXWindow", "AXGroup"]);
//!     act_on(&app, &field, ElementAction::Focus);
//! }
//! ```

mod actions;
mod attribute;
mod element;
mod error;
mod memory;
mod provider;
mod query;
mod registry;
mod selector;

pub mod platform;

pub use actions::{
    act_on, focus, press, press_menu_items, select, set_checked, toggle_menu_items,
    ElementAction, MenuAction, MenuCommand,
};
pub use attribute::{roles, Attribute, Notification, PRESS_ACTION};
pub use element::{ElementExt, UiElement};
pub use error::{AxError, AxResult};
pub use memory::{MemoryAccessibility, MemoryElement};
pub use provider::{Accessibility, AxEvent, NotificationHandler, Subscription};
pub use query::{
    find_ancestor, find_menu_item, find_menu_item_by_path, find_modal, find_selectable_ancestor,
    is_modal, DEFAULT_MODAL_SEARCH_DEPTH,
};
pub use registry::{SubscriptionId, SubscriptionRegistry};
pub use selector::{find_descendant, Selector};
