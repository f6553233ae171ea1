//! Subscription registry.
//!
//! Foreign notification callbacks only get an integer context back. The
//! registry maps that integer to the handler, so a callback for a removed
//! subscription finds nothing and does nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::attribute::Notification;
use crate::provider::{AxEvent, NotificationHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

pub struct SubscriptionRegistry {
    next: AtomicU64,
    handlers: Mutex<HashMap<SubscriptionId, NotificationHandler>>,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
            handlers: Mutex::new(HashMap::new()),
        }
    }
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: NotificationHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.insert(id, handler);
        }
        id
    }

    /// Returns whether `id` was registered.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        self.handlers
            .lock()
            .map(|mut handlers| handlers.remove(&id).is_some())
            .unwrap_or(false)
    }

    pub fn is_live(&self, id: SubscriptionId) -> bool {
        self.handlers
            .lock()
            .map(|handlers| handlers.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the handler for `id`, if it is still registered. The lock is not
    /// held while the handler runs.
    pub fn dispatch(&self, id: SubscriptionId, pid: i32, notification: Notification) -> bool {
        let handler = match self.handlers.lock() {
            Ok(handlers) => handlers.get(&id).cloned(),
            Err(_) => None,
        };

        match handler {
            Some(handler) => {
                handler(AxEvent {
                    subscription: id,
                    pid,
                    notification,
                });
                true
            }
            None => {
                tracing::trace!(subscription = %id, "notification for removed subscription ignored");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_dispatch_after_remove_is_noop() {
        let registry = SubscriptionRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let id = registry.register(Arc::new(move |_event| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(registry.dispatch(id, 7, Notification::WindowCreated));
        assert!(registry.remove(id));
        assert!(!registry.dispatch(id, 7, Notification::WindowCreated));
        assert!(!registry.remove(id));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = SubscriptionRegistry::new();
        let a = registry.register(Arc::new(|_| {}));
        let b = registry.register(Arc::new(|_| {}));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_event_carries_subscription() {
        let registry = SubscriptionRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let id = registry.register(Arc::new(move |event| {
            seen_clone.lock().unwrap().push(event);
        }));

        registry.dispatch(id, 42, Notification::FocusedElementChanged);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].subscription, id);
        assert_eq!(seen[0].pid, 42);
    }
}
