//! Mode definitions and resolution logic.
//!
//! Pure domain logic - no I/O, no platform dependencies.

use serde::{Deserialize, Serialize};

/// Text-editing mode owned by the external modal editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Insert,
    Normal,
    Visual,
}

impl EditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditMode::Insert => "insert",
            EditMode::Normal => "normal",
            EditMode::Visual => "visual",
        }
    }

    /// Parse the editor's own spelling. Anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "insert" => Some(EditMode::Insert),
            "normal" => Some(EditMode::Normal),
            "visual" => Some(EditMode::Visual),
            _ => None,
        }
    }
}

/// Override tracked by the aggregator itself.
///
/// - `Off`: the edit mode is reported as is.
/// - `Manual`: held until the editor confirms normal mode.
/// - `AutoRevert`: held until the overlay disappears, which then forces
///   normal mode.
/// - `Input`: like `Manual`, meant for deliberate text entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverrideMode {
    #[default]
    Off,
    Manual,
    AutoRevert,
    Input,
}

impl OverrideMode {
    /// Value exchanged with the external store. `Off` is the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideMode::Off => "",
            OverrideMode::Manual => "manual",
            OverrideMode::AutoRevert => "auto",
            OverrideMode::Input => "input",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" => Some(OverrideMode::Off),
            "manual" => Some(OverrideMode::Manual),
            "auto" => Some(OverrideMode::AutoRevert),
            "input" => Some(OverrideMode::Input),
            _ => None,
        }
    }
}

/// Hardware keyboard layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layer {
    #[default]
    None,
    Nav,
    Sym,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::None => "",
            Layer::Nav => "nav",
            Layer::Sym => "sym",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "nav" => Some(Layer::Nav),
            "sym" => Some(Layer::Sym),
            _ => None,
        }
    }
}

/// What the overlay app is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlayKind {
    #[default]
    None,
    Scroll,
    Search,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::None => "",
            OverlayKind::Scroll => "scroll",
            OverlayKind::Search => "search",
        }
    }
}

/// Classification of an application by the editor's own preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppFamily {
    #[default]
    None,
    Off,
    Pgr,
    Electron,
    KeyMapping,
    NineOneOne,
}

impl AppFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppFamily::None => "",
            AppFamily::Off => "off",
            AppFamily::Pgr => "pgr",
            AppFamily::Electron => "electron",
            AppFamily::KeyMapping => "keymap",
            AppFamily::NineOneOne => "911",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" => Some(AppFamily::None),
            "off" => Some(AppFamily::Off),
            "pgr" => Some(AppFamily::Pgr),
            "electron" => Some(AppFamily::Electron),
            "keymap" => Some(AppFamily::KeyMapping),
            "911" => Some(AppFamily::NineOneOne),
            _ => None,
        }
    }
}

/// Consolidated mode pushed to the remapping engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Off,
    Manual,
    AutoRevert,
    Input,
    Insert,
    Normal,
    Visual,
    Nav,
    Sym,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Off => "",
            Mode::Manual => "manual",
            Mode::AutoRevert => "auto",
            Mode::Input => "input",
            Mode::Insert => "insert",
            Mode::Normal => "normal",
            Mode::Visual => "visual",
            Mode::Nav => "nav",
            Mode::Sym => "sym",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EditMode> for Mode {
    fn from(mode: EditMode) -> Self {
        match mode {
            EditMode::Insert => Mode::Insert,
            EditMode::Normal => Mode::Normal,
            EditMode::Visual => Mode::Visual,
        }
    }
}

impl From<OverrideMode> for Mode {
    fn from(mode: OverrideMode) -> Self {
        match mode {
            OverrideMode::Off => Mode::Off,
            OverrideMode::Manual => Mode::Manual,
            OverrideMode::AutoRevert => Mode::AutoRevert,
            OverrideMode::Input => Mode::Input,
        }
    }
}

/// Resolve the consolidated mode.
///
/// Priority:
/// 1. Hardware layer (anything but `None`)
/// 2. Override (anything but `Off`)
/// 3. Edit mode
pub fn resolve_mode(layer: Layer, override_mode: OverrideMode, edit_mode: EditMode) -> Mode {
    match layer {
        Layer::Nav => return Mode::Nav,
        Layer::Sym => return Mode::Sym,
        Layer::None => {}
    }

    if override_mode != OverrideMode::Off {
        return override_mode.into();
    }

    edit_mode.into()
}
