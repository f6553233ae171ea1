//! Mode aggregation engine.
//!
//! ```text
//!  EditModeSource  FamilySource  LayerListener  WindowWatcher
//!        │              │              │              │
//!        │     FocusSource / OverlaySource (AX run loop thread)
//!        │              │              │              │
//!        └──────────────┴──────┬───────┴──────────────┘
//!                              ▼ SourceEvent
//!            ┌──────────────────────────────────────┐
//!            │ EventLoop (single thread)            │
//!            │   ModeAggregator                     │
//!            │     layer > override > edit mode     │
//!            │   AppModeMemory (debounced save)     │
//!            └──────────────────┬───────────────────┘
//!                               ▼ staged, diffed
//!            ┌──────────────────────────────────────┐
//!            │ PushQueue ─▶ push worker ─▶ CLI      │
//!            └──────────────────────────────────────┘
//! ```

mod aggregator;
mod config;
mod error;
mod event_loop;
mod memory;
mod runtime;

pub use aggregator::{AggregatorSettings, Flow, ModeAggregator};
pub use config::{expand_home, Config, ConfigError, ConfigResult, FamilyList, CONFIG_ENV};
pub use error::{EngineError, EngineResult};
pub use event_loop::EventLoop;
pub use memory::{AppModeMemory, SaveToken, DEFAULT_DEBOUNCE};
pub use runtime::{Runtime, DRAIN_TIMEOUT};
