//! Predicate-based element search.

use crate::attribute::Attribute;
use crate::element::{ElementExt, UiElement};

/// Describes the element to look for.
///
/// Every field left as `None` is a wildcard. When `allowed_ancestor_roles` is
/// non-empty the search only descends through elements whose role is listed
/// (or empty), which scopes a search to e.g. "only inside a toolbar".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub role: Option<String>,
    pub subrole: Option<String>,
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub value: Option<String>,
    pub label: Option<String>,
    pub allowed_ancestor_roles: Vec<String>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn subrole(mut self, subrole: impl Into<String>) -> Self {
        self.subrole = Some(subrole.into());
        self
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn within<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_ancestor_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `element` satisfies every set field. `role` is passed in
    /// because the search already read it for pruning.
    fn matches_with_role<E: UiElement>(&self, element: &E, role: &str) -> bool {
        if self.role.as_deref().is_some_and(|r| r != role) {
            return false;
        }

        let checks = [
            (&self.subrole, Attribute::Subrole),
            (&self.identifier, Attribute::Identifier),
            (&self.title, Attribute::Title),
            (&self.value, Attribute::Value),
            (&self.label, Attribute::Label),
        ];

        checks.into_iter().all(|(wanted, attribute)| match wanted {
            Some(wanted) => element.attribute_or_empty(attribute) == *wanted,
            None => true,
        })
    }

    pub fn matches<E: UiElement>(&self, element: &E) -> bool {
        self.matches_with_role(element, &element.role())
    }

    fn prunes(&self, role: &str) -> bool {
        !self.allowed_ancestor_roles.is_empty()
            && !role.is_empty()
            && !self.allowed_ancestor_roles.iter().any(|r| r == role)
    }
}

/// Depth-first pre-order search starting at (and including) `root`.
///
/// The first match is returned without looking at its descendants.
pub fn find_descendant<E: UiElement>(root: &E, selector: &Selector) -> Option<E> {
    let role = root.role();

    if selector.matches_with_role(root, &role) {
        return Some(root.clone());
    }

    if selector.prunes(&role) {
        return None;
    }

    root.child_elements()
        .iter()
        .find_map(|child| find_descendant(child, selector))
}
