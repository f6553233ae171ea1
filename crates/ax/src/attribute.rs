//! Attribute, action and notification names understood by the tree.

/// Element attributes read or written by modeglue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Role,
    Subrole,
    Identifier,
    Title,
    Value,
    Label,
    Placeholder,
    MenuItemMarkChar,
    Focused,
    Selected,
}

impl Attribute {
    /// Platform attribute name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Role => "AXRole",
            Attribute::Subrole => "AXSubrole",
            Attribute::Identifier => "AXIdentifier",
            Attribute::Title => "AXTitle",
            Attribute::Value => "AXValue",
            Attribute::Label => "AXLabelValue",
            Attribute::Placeholder => "AXPlaceholderValue",
            Attribute::MenuItemMarkChar => "AXMenuItemMarkChar",
            Attribute::Focused => "AXFocused",
            Attribute::Selected => "AXSelected",
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles and subroles with special meaning to the queries.
pub mod roles {
    pub const APPLICATION: &str = "AXApplication";
    pub const MENU_BAR: &str = "AXMenuBar";
    pub const MENU: &str = "AXMenu";
    pub const MENU_ITEM: &str = "AXMenuItem";
    pub const WINDOW: &str = "AXWindow";
    pub const SHEET: &str = "AXSheet";
    pub const TOOLBAR: &str = "AXToolbar";
    pub const DIALOG: &str = "AXDialog";
    pub const SYSTEM_DIALOG: &str = "AXSystemDialog";
}

/// Action performed by [`press`](crate::press).
pub const PRESS_ACTION: &str = "AXPress";

/// Notifications an observer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    WindowCreated,
    ElementDestroyed,
    FocusedElementChanged,
    FocusedWindowChanged,
    MainWindowChanged,
    ApplicationActivated,
    ApplicationDeactivated,
}

impl Notification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Notification::WindowCreated => "AXWindowCreated",
            Notification::ElementDestroyed => "AXUIElementDestroyed",
            Notification::FocusedElementChanged => "AXFocusedUIElementChanged",
            Notification::FocusedWindowChanged => "AXFocusedWindowChanged",
            Notification::MainWindowChanged => "AXMainWindowChanged",
            Notification::ApplicationActivated => "AXApplicationActivated",
            Notification::ApplicationDeactivated => "AXApplicationDeactivated",
        }
    }

    /// Reverse of [`Notification::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        const ALL: [Notification; 7] = [
            Notification::WindowCreated,
            Notification::ElementDestroyed,
            Notification::FocusedElementChanged,
            Notification::FocusedWindowChanged,
            Notification::MainWindowChanged,
            Notification::ApplicationActivated,
            Notification::ApplicationDeactivated,
        ];
        ALL.into_iter().find(|n| n.as_str() == name)
    }
}
