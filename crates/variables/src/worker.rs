//! Ordered pushes off the event thread.
//!
//! At most one batch is with the sink at a time. Its outcome comes back on a
//! channel the event thread owns, and the next batch is only taken once the
//! previous outcome has been applied, so batches reach the sink in issue
//! order.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::error::{VariableError, VariableResult};
use crate::sink::VariableSinkRef;
use crate::store::{PushBatch, VariableStore};

/// Result of one batch, delivered back to the event thread.
#[derive(Debug)]
pub struct PushOutcome {
    pub batch: PushBatch,
    pub result: VariableResult<()>,
}

/// Thread that owns the blocking sink calls.
pub struct PushWorker {
    tx: Option<Sender<PushBatch>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl PushWorker {
    pub fn spawn(sink: VariableSinkRef, done: Sender<PushOutcome>) -> VariableResult<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<PushBatch>();

        let handle = std::thread::Builder::new()
            .name("variable-push".into())
            .spawn(move || {
                tracing::debug!("push worker started");
                for batch in rx {
                    let result = sink.set_variables(&batch.values);
                    if done.send(PushOutcome { batch, result }).is_err() {
                        break;
                    }
                }
                tracing::debug!("push worker stopped");
            })
            .map_err(|source| VariableError::Spawn {
                program: "push worker".into(),
                source,
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    fn submit(&self, batch: PushBatch) -> VariableResult<()> {
        let tx = self.tx.as_ref().ok_or(VariableError::WorkerGone)?;
        tx.send(batch).map_err(|_| VariableError::WorkerGone)
    }

    /// Stop after the queued batch, if any.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PushWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

enum Mode {
    /// Sink called on the caller's thread.
    Inline(VariableSinkRef),
    Worker(PushWorker),
}

/// Push scheduling with a single in-flight slot.
pub struct PushQueue {
    mode: Mode,
    sink: VariableSinkRef,
    in_flight: bool,
    requested: bool,
}

impl PushQueue {
    /// Pushes block the caller.
    pub fn inline(sink: VariableSinkRef) -> Self {
        Self {
            mode: Mode::Inline(sink.clone()),
            sink,
            in_flight: false,
            requested: false,
        }
    }

    /// Pushes run on a worker thread; outcomes arrive on `done`.
    pub fn worker(sink: VariableSinkRef, done: Sender<PushOutcome>) -> VariableResult<Self> {
        let worker = PushWorker::spawn(sink.clone(), done)?;
        Ok(Self {
            mode: Mode::Worker(worker),
            sink,
            in_flight: false,
            requested: false,
        })
    }

    pub fn sink(&self) -> &VariableSinkRef {
        &self.sink
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Push whatever is pending. While a batch is in flight the request is
    /// remembered and served when its outcome arrives.
    pub fn request(&mut self, store: &mut VariableStore) {
        match &self.mode {
            Mode::Inline(sink) => {
                store.push(sink.as_ref());
            }
            Mode::Worker(worker) => {
                if self.in_flight {
                    self.requested = true;
                    return;
                }
                let Some(batch) = store.begin_push() else {
                    return;
                };
                tracing::debug!(count = batch.len(), "pushing variables");
                match worker.submit(batch) {
                    Ok(()) => self.in_flight = true,
                    Err(e) => tracing::error!(error = %e, "failed to queue push"),
                }
            }
        }
    }

    /// Apply an outcome from the worker.
    ///
    /// After a success anything still pending is pushed straight away.
    /// After a failure the pending set waits for the next request, unless
    /// one already arrived while the batch was in flight.
    pub fn on_complete(&mut self, store: &mut VariableStore, outcome: PushOutcome) {
        self.in_flight = false;
        let accepted = store.complete(outcome.batch, outcome.result);
        let requested = std::mem::take(&mut self.requested);

        if (accepted && store.has_pending()) || (!accepted && requested) {
            self.request(store);
        }
    }

    /// Wait for the in-flight batch, if any, and apply its outcome.
    /// Stops after one failure or when `timeout` runs out; a batch still
    /// with the sink then stays in flight until [`PushQueue::shutdown`].
    pub fn drain(
        &mut self,
        store: &mut VariableStore,
        done: &Receiver<PushOutcome>,
        timeout: Duration,
    ) {
        let deadline = Instant::now() + timeout;

        while self.in_flight {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match done.recv_timeout(remaining) {
                Ok(outcome) => {
                    let failed = outcome.result.is_err();
                    self.on_complete(store, outcome);
                    if failed {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!("timed out waiting for in-flight push");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.requested = false;
    }

    /// Stop the worker thread, if there is one.
    ///
    /// Joins the worker before returning, so the sink is idle afterwards
    /// even when a drain gave up on the in-flight batch. A late outcome is
    /// applied to `store` without pushing again.
    pub fn shutdown(&mut self, store: &mut VariableStore, done: &Receiver<PushOutcome>) {
        if let Mode::Worker(worker) = &mut self.mode {
            worker.shutdown();
            for outcome in done.try_iter() {
                store.complete(outcome.batch, outcome.result);
            }
        }
        store.abandon_push();
        self.in_flight = false;
        self.requested = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_file::EnvironmentFile;
    use crate::sink::{MemorySink, VariableSink, Variables};
    use std::sync::{Arc, Mutex};

    fn store() -> VariableStore {
        VariableStore::new(EnvironmentFile::new("/nonexistent/environment.json"))
    }

    /// Blocks each call until released, recording batches in order.
    struct GatedSink {
        gate: Mutex<Receiver<()>>,
        seen: Mutex<Vec<Variables>>,
    }

    impl VariableSink for GatedSink {
        fn set_variables(&self, variables: &Variables) -> VariableResult<()> {
            let _ = self.gate.lock().unwrap().recv();
            self.seen.lock().unwrap().push(variables.clone());
            Ok(())
        }
    }

    #[test]
    fn test_inline_pushes_immediately() {
        let sink = Arc::new(MemorySink::new());
        let mut queue = PushQueue::inline(sink.clone());
        let mut store = store();

        store.stage("a", "1");
        queue.request(&mut store);

        assert_eq!(sink.batches().len(), 1);
        assert!(!store.has_pending());
    }

    #[test]
    fn test_worker_serializes_batches_in_issue_order() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let sink = Arc::new(GatedSink {
            gate: Mutex::new(gate_rx),
            seen: Mutex::new(Vec::new()),
        });
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let mut queue = PushQueue::worker(sink.clone(), done_tx).unwrap();
        let mut store = store();

        store.stage("a", "1");
        queue.request(&mut store);
        assert!(queue.is_in_flight());

        // Staged while the first batch is blocked in the sink.
        store.stage("a", "2");
        store.stage("b", "x");
        queue.request(&mut store);

        gate_tx.send(()).unwrap();
        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        queue.on_complete(&mut store, outcome);
        assert!(queue.is_in_flight());

        gate_tx.send(()).unwrap();
        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        queue.on_complete(&mut store, outcome);
        assert!(!queue.is_in_flight());
        assert!(!store.has_pending());

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].get("a"), Some(&"1".into()));
        assert_eq!(seen[1].get("a"), Some(&"2".into()));
        assert_eq!(seen[1].get("b"), Some(&"x".into()));
    }

    #[test]
    fn test_failure_waits_for_next_request() {
        let sink = Arc::new(MemorySink::new());
        sink.set_failing(true);
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let mut queue = PushQueue::worker(sink.clone(), done_tx).unwrap();
        let mut store = store();

        store.stage("a", "1");
        queue.request(&mut store);
        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        queue.on_complete(&mut store, outcome);

        assert!(!queue.is_in_flight());
        assert!(store.has_pending());
        assert!(done_rx
            .recv_timeout(Duration::from_millis(100))
            .is_err());

        sink.set_failing(false);
        queue.request(&mut store);
        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        queue.on_complete(&mut store, outcome);
        assert!(!store.has_pending());
        assert_eq!(sink.batches().len(), 1);
    }

    #[test]
    fn test_drain_applies_in_flight_outcome() {
        let sink = Arc::new(MemorySink::new());
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let mut queue = PushQueue::worker(sink.clone(), done_tx).unwrap();
        let mut store = store();

        store.stage("a", "1");
        queue.request(&mut store);
        queue.drain(&mut store, &done_rx, Duration::from_secs(2));

        assert!(!queue.is_in_flight());
        assert!(!store.has_pending());
        queue.shutdown(&mut store, &done_rx);
    }

    #[test]
    fn test_value_reverted_during_flight_reaches_sink() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let sink = Arc::new(GatedSink {
            gate: Mutex::new(gate_rx),
            seen: Mutex::new(Vec::new()),
        });
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let mut queue = PushQueue::worker(sink.clone(), done_tx).unwrap();
        let mut store = store();

        store.stage("a", "0");
        queue.request(&mut store);
        gate_tx.send(()).unwrap();
        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        queue.on_complete(&mut store, outcome);

        // Flip away and back while the first flip is blocked in the sink.
        store.stage("a", "1");
        queue.request(&mut store);
        store.stage("a", "0");
        queue.request(&mut store);

        gate_tx.send(()).unwrap();
        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        queue.on_complete(&mut store, outcome);
        assert!(queue.is_in_flight());

        gate_tx.send(()).unwrap();
        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        queue.on_complete(&mut store, outcome);
        assert!(!queue.is_in_flight());
        assert!(!store.has_pending());
        assert_eq!(store.current("a"), Some(&"0".into()));

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.last().and_then(|batch| batch.get("a")), Some(&"0".into()));
        drop(seen);
        queue.shutdown(&mut store, &done_rx);
    }

    #[test]
    fn test_shutdown_waits_for_batch_abandoned_by_drain() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let sink = Arc::new(GatedSink {
            gate: Mutex::new(gate_rx),
            seen: Mutex::new(Vec::new()),
        });
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let mut queue = PushQueue::worker(sink.clone(), done_tx).unwrap();
        let mut store = store();

        store.stage("a", "1");
        queue.request(&mut store);
        queue.drain(&mut store, &done_rx, Duration::from_millis(20));
        assert!(queue.is_in_flight());

        let release = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            gate_tx.send(()).unwrap();
        });
        queue.shutdown(&mut store, &done_rx);
        release.join().unwrap();

        assert_eq!(sink.seen.lock().unwrap().len(), 1);
        assert!(!queue.is_in_flight());
        assert!(!store.is_pushing());
        assert_eq!(store.current("a"), Some(&"1".into()));
    }
}
