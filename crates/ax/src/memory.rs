//! In-memory accessibility tree.
//!
//! Backs tests and headless runs; mirrors what the platform tree exposes
//! without talking to any foreign process.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

use crate::attribute::{Attribute, Notification, PRESS_ACTION};
use crate::element::UiElement;
use crate::error::{AxError, AxResult};
use crate::provider::{Accessibility, NotificationHandler, Subscription};
use crate::registry::{SubscriptionId, SubscriptionRegistry};

#[derive(Default)]
struct NodeState {
    attributes: HashMap<Attribute, String>,
    flags: HashMap<Attribute, bool>,
    settable: HashSet<Attribute>,
    actions: Vec<String>,
    performed: Vec<String>,
    children: Vec<MemoryElement>,
    parent: Weak<Mutex<NodeState>>,
    windows: Vec<MemoryElement>,
    focused: Option<MemoryElement>,
    menu_bar: Option<MemoryElement>,
    pid: i32,
    fail_children: bool,
    rename_on_press: Option<String>,
}

/// A node of an in-memory tree. Clones share the node.
#[derive(Clone, Default)]
pub struct MemoryElement(Arc<Mutex<NodeState>>);

impl std::fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.0.lock().unwrap();
        f.debug_struct("MemoryElement")
            .field("role", &state.attributes.get(&Attribute::Role))
            .field("title", &state.attributes.get(&Attribute::Title))
            .field("children", &state.children.len())
            .finish()
    }
}

impl MemoryElement {
    pub fn new(role: &str) -> Self {
        let element = Self::default();
        if !role.is_empty() {
            element.set(Attribute::Role, role);
        }
        element
    }

    pub fn with(self, attribute: Attribute, value: &str) -> Self {
        self.set(attribute, value);
        self
    }

    pub fn with_action(self, action: &str) -> Self {
        self.0.lock().unwrap().actions.push(action.to_string());
        self
    }

    pub fn with_pid(self, pid: i32) -> Self {
        self.0.lock().unwrap().pid = pid;
        self
    }

    pub fn set(&self, attribute: Attribute, value: &str) {
        self.0
            .lock()
            .unwrap()
            .attributes
            .insert(attribute, value.to_string());
    }

    pub fn remove(&self, attribute: Attribute) {
        self.0.lock().unwrap().attributes.remove(&attribute);
    }

    /// Append `child`, set its parent link, and hand it back.
    pub fn add_child(&self, child: MemoryElement) -> MemoryElement {
        child.0.lock().unwrap().parent = Arc::downgrade(&self.0);
        self.0.lock().unwrap().children.push(child.clone());
        child
    }

    pub fn clear_children(&self) {
        self.0.lock().unwrap().children.clear();
    }

    pub fn set_windows(&self, windows: Vec<MemoryElement>) {
        self.0.lock().unwrap().windows = windows;
    }

    pub fn set_focused(&self, focused: Option<MemoryElement>) {
        self.0.lock().unwrap().focused = focused;
    }

    pub fn set_menu_bar(&self, menu_bar: MemoryElement) {
        self.0.lock().unwrap().menu_bar = Some(menu_bar);
    }

    pub fn set_settable(&self, attribute: Attribute) {
        self.0.lock().unwrap().settable.insert(attribute);
    }

    /// Make every `children()` read fail, as an unresponsive process would.
    pub fn fail_children(&self) {
        self.0.lock().unwrap().fail_children = true;
    }

    /// Change the title when pressed, like menu items that flip their name.
    pub fn on_press_set_title(&self, title: &str) {
        self.0.lock().unwrap().rename_on_press = Some(title.to_string());
    }

    pub fn flag(&self, attribute: Attribute) -> Option<bool> {
        self.0.lock().unwrap().flags.get(&attribute).copied()
    }

    /// Actions performed on this element, in order.
    pub fn performed(&self) -> Vec<String> {
        self.0.lock().unwrap().performed.clone()
    }

    pub fn same_node(&self, other: &MemoryElement) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl UiElement for MemoryElement {
    fn string_attribute(&self, attribute: Attribute) -> AxResult<Option<String>> {
        Ok(self.0.lock().unwrap().attributes.get(&attribute).cloned())
    }

    fn is_settable(&self, attribute: Attribute) -> AxResult<bool> {
        Ok(self.0.lock().unwrap().settable.contains(&attribute))
    }

    fn set_bool(&self, attribute: Attribute, value: bool) -> AxResult<()> {
        let mut state = self.0.lock().unwrap();
        if !state.settable.contains(&attribute) {
            return Err(AxError::Unsupported(attribute.as_str().to_string()));
        }
        state.flags.insert(attribute, value);
        Ok(())
    }

    fn perform(&self, action: &str) -> AxResult<()> {
        let mut state = self.0.lock().unwrap();
        if !state.actions.iter().any(|a| a == action) {
            return Err(AxError::Unsupported(action.to_string()));
        }
        state.performed.push(action.to_string());
        if action == PRESS_ACTION {
            if let Some(title) = state.rename_on_press.take() {
                state.attributes.insert(Attribute::Title, title);
            }
        }
        Ok(())
    }

    fn actions(&self) -> AxResult<Vec<String>> {
        Ok(self.0.lock().unwrap().actions.clone())
    }

    fn children(&self) -> AxResult<Vec<Self>> {
        let state = self.0.lock().unwrap();
        if state.fail_children {
            return Err(AxError::CannotComplete);
        }
        Ok(state.children.clone())
    }

    fn parent(&self) -> AxResult<Option<Self>> {
        Ok(self.0.lock().unwrap().parent.upgrade().map(MemoryElement))
    }

    fn focused_element(&self) -> AxResult<Option<Self>> {
        Ok(self.0.lock().unwrap().focused.clone())
    }

    fn windows(&self) -> AxResult<Vec<Self>> {
        Ok(self.0.lock().unwrap().windows.clone())
    }

    fn menu_bar(&self) -> AxResult<Option<Self>> {
        Ok(self.0.lock().unwrap().menu_bar.clone())
    }

    fn pid(&self) -> AxResult<i32> {
        Ok(self.0.lock().unwrap().pid)
    }
}

struct MemorySubscription {
    id: SubscriptionId,
    pid: i32,
    notifications: Vec<Notification>,
}

/// [`Accessibility`] over a set of in-memory application trees.
///
/// Notifications are raised by hand with [`MemoryAccessibility::emit`].
pub struct MemoryAccessibility {
    apps: Mutex<HashMap<i32, MemoryElement>>,
    focused_pid: Mutex<Option<i32>>,
    trusted: std::sync::atomic::AtomicBool,
    registry: SubscriptionRegistry,
    subscriptions: Mutex<Vec<MemorySubscription>>,
}

impl Default for MemoryAccessibility {
    fn default() -> Self {
        Self {
            apps: Mutex::new(HashMap::new()),
            focused_pid: Mutex::new(None),
            trusted: std::sync::atomic::AtomicBool::new(true),
            registry: SubscriptionRegistry::new(),
            subscriptions: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryAccessibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the application element for `pid`.
    pub fn insert_app(&self, pid: i32, app: MemoryElement) {
        app.0.lock().unwrap().pid = pid;
        self.apps.lock().unwrap().insert(pid, app);
    }

    pub fn set_focused_app(&self, pid: Option<i32>) {
        *self.focused_pid.lock().unwrap() = pid;
    }

    pub fn set_trusted(&self, trusted: bool) {
        self.trusted
            .store(trusted, std::sync::atomic::Ordering::SeqCst);
    }

    /// Deliver `notification` to every live subscription on `pid` that asked
    /// for it. Returns how many handlers ran.
    pub fn emit(&self, pid: i32, notification: Notification) -> usize {
        let targets: Vec<SubscriptionId> = self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.pid == pid && s.notifications.contains(&notification))
            .map(|s| s.id)
            .collect();

        targets
            .into_iter()
            .filter(|id| self.registry.dispatch(*id, pid, notification))
            .count()
    }

    pub fn live_subscriptions(&self) -> usize {
        self.registry.len()
    }
}

impl Accessibility for MemoryAccessibility {
    type Element = MemoryElement;

    fn is_trusted(&self) -> bool {
        self.trusted.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn application(&self, pid: i32) -> Option<MemoryElement> {
        let app = self
            .apps
            .lock()
            .unwrap()
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| MemoryElement::new("").with_pid(pid));
        Some(app)
    }

    fn focused_application(&self) -> Option<MemoryElement> {
        let pid = (*self.focused_pid.lock().unwrap())?;
        self.application(pid)
    }

    fn subscribe(
        &self,
        subscription: &Subscription,
        handler: NotificationHandler,
    ) -> AxResult<SubscriptionId> {
        if !self.is_trusted() {
            return Err(AxError::PermissionDenied);
        }
        let id = self.registry.register(handler);
        self.subscriptions.lock().unwrap().push(MemorySubscription {
            id,
            pid: subscription.pid,
            notifications: subscription.notifications.clone(),
        });
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registry.remove(id);
        self.subscriptions.lock().unwrap().retain(|s| s.id != id);
    }
}
