//! Event sink abstraction for delivering source events.
//!
//! Sources never touch aggregator state. They hand events to a sink, and the
//! sink decides where they go: the event thread's channel in production, a
//! buffer in tests.

use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;

use crate::SourceEvent;

/// Trait for delivering events to the event thread.
///
/// Called from any thread, including foreign notification threads.
pub trait EventSink: Send + Sync {
    fn send(&self, event: SourceEvent);
}

/// Type alias for shared event sink reference.
pub type EventSinkRef = Arc<dyn EventSink>;

/// Forwards events into a crossbeam channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: Sender<SourceEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<SourceEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn send(&self, event: SourceEvent) {
        let topic = event.topic();
        if self.tx.send(event).is_err() {
            // Receiver is gone once the event loop has shut down.
            tracing::trace!(topic, "event dropped, event loop stopped");
        }
    }
}

/// In-memory sink for testing.
///
/// Captures all delivered events for later inspection.
#[derive(Default)]
pub struct InMemorySink {
    events: Mutex<Vec<SourceEvent>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured events.
    pub fn events(&self) -> Vec<SourceEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Get events for a specific topic.
    pub fn events_for(&self, topic: &str) -> Vec<SourceEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.topic() == topic)
            .cloned()
            .collect()
    }

    /// Remove and return everything captured so far.
    pub fn take(&self) -> Vec<SourceEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl EventSink for InMemorySink {
    fn send(&self, event: SourceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Sink that discards all events.
pub struct NullSink;

impl EventSink for NullSink {
    fn send(&self, _event: SourceEvent) {}
}
