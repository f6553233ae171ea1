//! Window and mode context for modeglue.
//!
//! This crate holds the mode vocabulary shared by every other crate and
//! tracks what the user is looking at:
//! - Frontmost application (accessibility focus first, workspace second)
//! - Overlay application (a focused launcher-style panel)
//! - Identifier of the frontmost window
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  mode.rs     - Mode union and resolution logic (pure)        │
//! │  app.rs      - AppInfo, background process filtering         │
//! │  window.rs   - WindowTracker derivation and change detection │
//! │  provider.rs - WindowProbe trait                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  platform/macos.rs - macOS-specific implementation          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  poller.rs - Woken and fallback reads, change callbacks      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use modeglue_context::{platform, WindowRules, WindowWatcher};
//! use std::sync::Arc;
//!
//! let probe = Arc::new(platform::probe());
//! let mut watcher = WindowWatcher::new();
//!
//! watcher.start(probe, WindowRules::default(), Arc::new(|snapshot| {
//!     println!("App: {}, window: {}", snapshot.frontmost_name(), snapshot.window_identifier);
//! }));
//! ```

mod app;
mod mode;
mod poller;
mod provider;
mod window;

pub mod platform;

// Re-export main types
pub use app::{is_background_bundle, AppInfo, BACKGROUND_BUNDLE_IDS};
pub use mode::{resolve_mode, AppFamily, EditMode, Layer, Mode, OverlayKind, OverrideMode};
pub use poller::{WindowCallback, WindowWaker, WindowWatcher, DEFAULT_POLL_INTERVAL};
pub use provider::{NullProbe, StaticProbe, WindowProbe};
pub use window::{WindowRules, WindowSnapshot, WindowTracker};
