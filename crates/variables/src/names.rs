//! Variable names shared with the remapping rules.

use crate::value::VariableValue;

pub const DEFAULT_PREFIX: &str = "kG.";

/// Prefixed variable names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNames {
    prefix: String,
}

impl Default for VariableNames {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl VariableNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn name(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    /// Override mode. The only variable also read back.
    pub fn mode(&self) -> String {
        self.name("mode")
    }

    pub fn consolidated_mode(&self) -> String {
        self.name("consolidatedMode")
    }

    pub fn overlay_type(&self) -> String {
        self.name("homerowOverlayType")
    }

    pub fn frontmost_app(&self) -> String {
        self.name("frontmostApp")
    }

    pub fn overlay_app(&self) -> String {
        self.name("overlayApp")
    }

    pub fn window_identifier(&self) -> String {
        self.name("windowIdentifier")
    }

    pub fn frontmost_app_family(&self) -> String {
        self.name("frontmostAppFamily")
    }

    pub fn modal_role(&self) -> String {
        self.name("modalRole")
    }

    pub fn focused_role(&self) -> String {
        self.name("focusedRole")
    }

    pub fn focused_subrole(&self) -> String {
        self.name("focusedSubrole")
    }

    pub fn focused_placeholder(&self) -> String {
        self.name("focusedPlaceholder")
    }

    /// Every variable with the value written at startup and shutdown.
    pub fn defaults(&self) -> Vec<(String, VariableValue)> {
        [
            self.mode(),
            self.consolidated_mode(),
            self.overlay_type(),
            self.frontmost_app(),
            self.overlay_app(),
            self.window_identifier(),
            self.frontmost_app_family(),
            self.modal_role(),
            self.focused_role(),
            self.focused_subrole(),
            self.focused_placeholder(),
        ]
        .into_iter()
        .map(|name| (name, VariableValue::default()))
        .collect()
    }
}
