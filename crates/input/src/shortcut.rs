//! Outgoing shortcut definitions.

use serde::{Deserialize, Serialize};

use crate::error::InputResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Control,
    Option,
    Command,
    Shift,
}

/// A virtual key code plus modifiers, posted as a key-down/key-up pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub key_code: u16,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

impl Shortcut {
    pub fn new(key_code: u16, modifiers: &[Modifier]) -> Self {
        Self {
            key_code,
            modifiers: modifiers.to_vec(),
        }
    }

    /// Ctrl-[ puts the modal editor into normal mode.
    pub fn normal_mode() -> Self {
        Self::new(33, &[Modifier::Control])
    }

    /// `v` from normal mode enters visual mode.
    pub fn visual_mode() -> Self {
        Self::new(9, &[])
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

/// Posts shortcuts into the OS input stream.
pub trait ShortcutPoster: Send + Sync {
    fn post(&self, shortcut: &Shortcut) -> InputResult<()>;
}

/// Poster that records instead of posting, for tests.
#[derive(Default)]
pub struct RecordingPoster {
    posted: std::sync::Mutex<Vec<Shortcut>>,
}

impl RecordingPoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posted(&self) -> Vec<Shortcut> {
        self.posted.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.posted.lock().unwrap().clear();
    }
}

impl ShortcutPoster for RecordingPoster {
    fn post(&self, shortcut: &Shortcut) -> InputResult<()> {
        self.posted.lock().unwrap().push(shortcut.clone());
        Ok(())
    }
}

/// Poster for platforms without synthetic input.
#[derive(Debug, Default)]
pub struct NullPoster;

impl NullPoster {
    pub fn new() -> Self {
        Self
    }
}

impl ShortcutPoster for NullPoster {
    fn post(&self, _shortcut: &Shortcut) -> InputResult<()> {
        Err(crate::error::InputError::Unsupported)
    }
}
