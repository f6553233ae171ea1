//! Read/act facade over a single element of a foreign UI hierarchy.

use crate::attribute::Attribute;
use crate::error::{AxError, AxResult};

/// A handle to one element of some application's accessibility tree.
///
/// Handles are cheap to clone and are never cached across queries: every
/// attribute read goes back to the owning process. The raw methods report
/// failures; the lenient accessors in [`ElementExt`] log them and fall back
/// to empty values, which is what the queries use.
pub trait UiElement: Clone {
    /// Read a string-valued attribute. `Ok(None)` means the attribute exists
    /// but has no value (or a non-string one).
    fn string_attribute(&self, attribute: Attribute) -> AxResult<Option<String>>;

    /// Whether `attribute` can be written on this element.
    fn is_settable(&self, attribute: Attribute) -> AxResult<bool>;

    /// Write a boolean attribute.
    fn set_bool(&self, attribute: Attribute, value: bool) -> AxResult<()>;

    /// Perform a named action such as `AXPress`.
    fn perform(&self, action: &str) -> AxResult<()>;

    /// Names of the actions the element supports.
    fn actions(&self) -> AxResult<Vec<String>>;

    fn children(&self) -> AxResult<Vec<Self>>;

    fn parent(&self) -> AxResult<Option<Self>>;

    /// Focused descendant; only meaningful on an application element.
    fn focused_element(&self) -> AxResult<Option<Self>>;

    /// Windows in front-to-back order; only meaningful on an application element.
    fn windows(&self) -> AxResult<Vec<Self>>;

    /// Menu bar; only meaningful on an application element.
    fn menu_bar(&self) -> AxResult<Option<Self>>;

    /// Process that owns the element.
    fn pid(&self) -> AxResult<i32>;
}

pub(crate) fn log_failure(what: &str, error: &AxError) {
    match error {
        AxError::PermissionDenied => tracing::warn!(error = %error, "{what} failed"),
        e if e.is_benign() => tracing::trace!(error = %e, "{what} unavailable"),
        e => tracing::debug!(error = %e, "{what} failed"),
    }
}

/// Lenient accessors: failures are logged and read as empty.
pub trait ElementExt: UiElement {
    fn attribute_or_empty(&self, attribute: Attribute) -> String {
        match self.string_attribute(attribute) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                log_failure(attribute.as_str(), &e);
                String::new()
            }
        }
    }

    fn role(&self) -> String {
        self.attribute_or_empty(Attribute::Role)
    }

    fn subrole(&self) -> String {
        self.attribute_or_empty(Attribute::Subrole)
    }

    fn identifier(&self) -> String {
        self.attribute_or_empty(Attribute::Identifier)
    }

    fn title(&self) -> String {
        self.attribute_or_empty(Attribute::Title)
    }

    fn value(&self) -> String {
        self.attribute_or_empty(Attribute::Value)
    }

    fn label(&self) -> String {
        self.attribute_or_empty(Attribute::Label)
    }

    fn placeholder(&self) -> String {
        self.attribute_or_empty(Attribute::Placeholder)
    }

    fn child_elements(&self) -> Vec<Self> {
        self.children().unwrap_or_else(|e| {
            log_failure("children", &e);
            Vec::new()
        })
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent().unwrap_or_else(|e| {
            log_failure("parent", &e);
            None
        })
    }

    fn window_elements(&self) -> Vec<Self> {
        self.windows().unwrap_or_else(|e| {
            log_failure("windows", &e);
            Vec::new()
        })
    }

    fn focused(&self) -> Option<Self> {
        self.focused_element().unwrap_or_else(|e| {
            log_failure("focused element", &e);
            None
        })
    }

    fn can_set(&self, attribute: Attribute) -> bool {
        self.is_settable(attribute).unwrap_or_else(|e| {
            log_failure(attribute.as_str(), &e);
            false
        })
    }

    fn is_focusable(&self) -> bool {
        self.can_set(Attribute::Focused)
    }

    fn is_selectable(&self) -> bool {
        self.can_set(Attribute::Selected)
    }

    /// A menu item is checked when it shows a non-empty mark character.
    fn is_checked(&self) -> bool {
        !self.attribute_or_empty(Attribute::MenuItemMarkChar).is_empty()
    }
}

impl<T: UiElement> ElementExt for T {}
