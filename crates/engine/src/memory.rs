//! Per-app edit mode memory.
//!
//! Saves are debounced through one global timer: every save cancels the
//! previously armed one, so only the last save in a burst is committed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use modeglue_context::EditMode;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Identifies one armed save. Firing a token that is no longer armed is a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveToken(u64);

#[derive(Debug)]
struct ArmedSave {
    token: SaveToken,
    pid: i32,
    mode: EditMode,
    due: Instant,
}

#[derive(Debug)]
pub struct AppModeMemory {
    modes: HashMap<i32, EditMode>,
    armed: Option<ArmedSave>,
    next_token: u64,
    debounce: Duration,
}

impl Default for AppModeMemory {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl AppModeMemory {
    pub fn new(debounce: Duration) -> Self {
        Self {
            modes: HashMap::new(),
            armed: None,
            next_token: 0,
            debounce,
        }
    }

    /// Arm a save of `mode` for `pid`, replacing any armed save.
    pub fn save(&mut self, pid: i32, mode: EditMode, now: Instant) -> SaveToken {
        self.next_token += 1;
        let token = SaveToken(self.next_token);
        self.armed = Some(ArmedSave {
            token,
            pid,
            mode,
            due: now + self.debounce,
        });
        token
    }

    pub fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            tracing::trace!(pid = armed.pid, "cancelled mode save");
        }
    }

    /// When the armed save is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|armed| armed.due)
    }

    /// Commit the save armed under `token`. Returns false for stale tokens.
    pub fn fire(&mut self, token: SaveToken) -> bool {
        match self.armed.take() {
            Some(armed) if armed.token == token => {
                tracing::debug!(pid = armed.pid, mode = armed.mode.as_str(), "saved app mode");
                self.modes.insert(armed.pid, armed.mode);
                true
            }
            other => {
                self.armed = other;
                false
            }
        }
    }

    /// Commit the armed save if it is due at `now`.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match &self.armed {
            Some(armed) if armed.due <= now => {
                let token = armed.token;
                self.fire(token)
            }
            _ => false,
        }
    }

    /// Last committed mode for `pid`, insert if none.
    pub fn recall(&self, pid: Option<i32>) -> EditMode {
        pid.and_then(|pid| self.modes.get(&pid).copied())
            .unwrap_or_default()
    }
}
