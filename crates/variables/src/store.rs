//! Staged variable state.
//!
//! Each variable has a committed value (last accepted by the sink) and
//! possibly a pending one. Outside a push, a pending value never equals the
//! committed one. While a batch is with the sink, names in that batch are
//! compared against the batch instead, and the pending set is re-diffed once
//! the outcome is known.

use std::collections::HashMap;

use crate::env_file::EnvironmentFile;
use crate::error::VariableResult;
use crate::sink::{VariableSink, Variables};
use crate::value::VariableValue;

/// Snapshot of the pending set handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushBatch {
    pub values: Variables,
}

impl PushBatch {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug)]
pub struct VariableStore {
    current: HashMap<String, VariableValue>,
    pending: Variables,
    in_flight: Option<Variables>,
    environment: EnvironmentFile,
}

impl VariableStore {
    pub fn new(environment: EnvironmentFile) -> Self {
        Self {
            current: HashMap::new(),
            pending: Variables::new(),
            in_flight: None,
            environment,
        }
    }

    /// Record an intended value. Staging the committed value cancels any
    /// pending write for `name`. A name in the batch being pushed is always
    /// kept pending until that batch's outcome is applied.
    pub fn stage(&mut self, name: &str, value: impl Into<VariableValue>) {
        let value = value.into();
        let pushing = self
            .in_flight
            .as_ref()
            .is_some_and(|batch| batch.contains_key(name));
        if !pushing && self.current.get(name) == Some(&value) {
            self.pending.remove(name);
        } else {
            self.pending.insert(name.to_string(), value);
        }
    }

    pub fn stage_all<I, N, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<VariableValue>,
    {
        for (name, value) in values {
            self.stage(name.as_ref(), value);
        }
    }

    pub fn current(&self, name: &str) -> Option<&VariableValue> {
        self.current.get(name)
    }

    pub fn pending(&self) -> &Variables {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pushing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Snapshot the pending set, `None` if there is nothing to push.
    pub fn begin_push(&mut self) -> Option<PushBatch> {
        if self.pending.is_empty() {
            return None;
        }
        let values = self.pending.clone();
        self.in_flight = Some(values.clone());
        Some(PushBatch { values })
    }

    /// Apply the sink's verdict on `batch`. Returns whether it was accepted.
    ///
    /// On success each pushed value becomes committed. Either way, pending
    /// entries that now equal the committed value are dropped and the rest
    /// are left for the next push.
    pub fn complete(&mut self, batch: PushBatch, result: VariableResult<()>) -> bool {
        self.in_flight = None;
        let accepted = match result {
            Ok(()) => {
                self.current.extend(batch.values);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, count = batch.len(), "failed to push variables");
                false
            }
        };
        let current = &self.current;
        self.pending
            .retain(|name, value| current.get(name) != Some(value));
        accepted
    }

    /// Forget a batch whose outcome will never be applied. What the sink
    /// holds for its names is unknown afterwards.
    pub fn abandon_push(&mut self) {
        if let Some(batch) = self.in_flight.take() {
            for name in batch.keys() {
                self.current.remove(name);
            }
        }
    }

    /// Push the pending set synchronously. One sink call per push.
    pub fn push(&mut self, sink: &dyn VariableSink) -> bool {
        let Some(batch) = self.begin_push() else {
            return true;
        };
        tracing::debug!(count = batch.len(), "pushing variables");
        let result = sink.set_variables(&batch.values);
        self.complete(batch, result)
    }

    /// Stage and push `defaults` regardless of what is believed committed.
    pub fn force_defaults(
        &mut self,
        defaults: &[(String, VariableValue)],
        sink: &dyn VariableSink,
    ) -> bool {
        for (name, value) in defaults {
            self.current.remove(name);
            self.stage(name, value.clone());
        }
        self.push(sink)
    }

    /// Read `name` back from the environment file. A successful read becomes
    /// the committed value. Failures are logged and read as `None`.
    pub fn read(&mut self, name: &str) -> Option<String> {
        match self.environment.read(name) {
            Ok(Some(value)) => {
                let read = VariableValue::from(value.as_str());
                if self.pending.get(name) == Some(&read) {
                    self.pending.remove(name);
                }
                self.current.insert(name.to_string(), read);
                Some(value)
            }
            Ok(None) => {
                tracing::debug!(name, "variable not present in environment file");
                None
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "failed to read variable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VariableError;
    use crate::sink::MemorySink;
    use std::io::Write;

    fn store() -> VariableStore {
        VariableStore::new(EnvironmentFile::new("/nonexistent/environment.json"))
    }

    #[test]
    fn test_staging_committed_value_cancels_pending() {
        let sink = MemorySink::new();
        let mut store = store();

        store.stage("a", "1");
        assert!(store.push(&sink));

        store.stage("a", "2");
        assert!(store.has_pending());
        store.stage("a", "1");
        assert!(store.pending().is_empty());
    }

    #[test]
    fn test_push_sends_one_batch_with_all_pending() {
        let sink = MemorySink::new();
        let mut store = store();

        store.stage("a", "1");
        store.stage("b", "2");
        assert!(store.push(&sink));

        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert!(!store.has_pending());
        assert_eq!(store.current("b"), Some(&VariableValue::from("2")));
    }

    #[test]
    fn test_failed_push_keeps_identical_pending_set() {
        let sink = MemorySink::new();
        let mut store = store();
        store.stage("a", "1");
        store.stage("b", "2");

        sink.set_failing(true);
        let before = store.pending().clone();
        assert!(!store.push(&sink));
        assert_eq!(store.pending(), &before);

        sink.set_failing(false);
        assert!(store.push(&sink));
        assert_eq!(sink.batches(), vec![before]);
    }

    #[test]
    fn test_empty_push_is_noop() {
        let sink = MemorySink::new();
        let mut store = store();
        assert!(store.push(&sink));
        assert!(sink.batches().is_empty());
    }

    #[test]
    fn test_value_staged_during_flight_survives_completion() {
        let mut store = store();
        store.stage("a", "1");
        let batch = store.begin_push().unwrap();

        store.stage("a", "2");
        assert!(store.complete(batch, Ok(())));

        assert_eq!(store.current("a"), Some(&VariableValue::from("1")));
        assert_eq!(store.pending().get("a"), Some(&VariableValue::from("2")));
    }

    #[test]
    fn test_revert_staged_during_flight_is_pushed_after_completion() {
        let sink = MemorySink::new();
        let mut store = store();
        store.stage("a", "0");
        assert!(store.push(&sink));

        store.stage("a", "1");
        let batch = store.begin_push().unwrap();
        store.stage("a", "0");
        assert!(store.complete(batch, Ok(())));

        assert_eq!(store.current("a"), Some(&VariableValue::from("1")));
        assert_eq!(store.pending().get("a"), Some(&VariableValue::from("0")));
    }

    #[test]
    fn test_failed_flight_drops_pending_equal_to_committed() {
        let sink = MemorySink::new();
        let mut store = store();
        store.stage("a", "0");
        assert!(store.push(&sink));

        store.stage("a", "1");
        let batch = store.begin_push().unwrap();
        store.stage("a", "0");
        assert!(!store.complete(batch, Err(VariableError::WorkerGone)));

        assert!(!store.is_pushing());
        assert!(store.pending().is_empty());
    }

    #[test]
    fn test_abandoned_push_forgets_committed_values() {
        let sink = MemorySink::new();
        let mut store = store();
        store.stage("a", "0");
        store.stage("b", "0");
        assert!(store.push(&sink));

        store.stage("a", "1");
        let _batch = store.begin_push().unwrap();
        store.abandon_push();

        assert!(!store.is_pushing());
        assert_eq!(store.current("a"), None);
        assert_eq!(store.current("b"), Some(&VariableValue::from("0")));
    }

    #[test]
    fn test_force_defaults_ignores_diffing() {
        let sink = MemorySink::new();
        let mut store = store();
        let defaults = vec![("a".to_string(), VariableValue::from(""))];

        assert!(store.force_defaults(&defaults, &sink));
        assert!(store.force_defaults(&defaults, &sink));
        assert_eq!(sink.batches().len(), 2);
    }

    #[test]
    fn test_read_commits_and_clears_equal_pending() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\n  \"kG.mode\": \"auto\",\n}\n").unwrap();

        let mut store = VariableStore::new(EnvironmentFile::new(file.path()));
        store.stage("kG.mode", "auto");

        assert_eq!(store.read("kG.mode"), Some("auto".to_string()));
        assert!(!store.has_pending());
        assert_eq!(store.current("kG.mode"), Some(&VariableValue::from("auto")));
    }

    #[test]
    fn test_read_failure_is_none() {
        let mut store = store();
        assert_eq!(store.read("kG.mode"), None);
    }
}
