//! Where pushed variables go.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{VariableError, VariableResult};
use crate::value::VariableValue;

/// A batch of name/value pairs, ordered by name.
pub type Variables = BTreeMap<String, VariableValue>;

pub const DEFAULT_CLI_PATH: &str =
    "/Library/Application Support/org.pqrs/Karabiner-Elements/bin/karabiner_cli";

/// External consumer of variable batches.
///
/// One call per batch. Implementations block until the consumer has
/// accepted or rejected the whole batch.
pub trait VariableSink: Send + Sync {
    fn set_variables(&self, variables: &Variables) -> VariableResult<()>;
}

/// Type alias for shared sink reference.
pub type VariableSinkRef = Arc<dyn VariableSink>;

/// Pushes through `karabiner_cli --set-variables <json>`.
#[derive(Debug, Clone)]
pub struct KarabinerCli {
    program: PathBuf,
}

impl Default for KarabinerCli {
    fn default() -> Self {
        Self::new(DEFAULT_CLI_PATH)
    }
}

impl KarabinerCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl VariableSink for KarabinerCli {
    fn set_variables(&self, variables: &Variables) -> VariableResult<()> {
        let json = serde_json::to_string(variables)?;
        let program = self.program.display().to_string();

        tracing::trace!(%program, %json, "setting variables");

        let output = Command::new(&self.program)
            .arg("--set-variables")
            .arg(&json)
            .output()
            .map_err(|source| VariableError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VariableError::Exit {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Sink that records every batch, for tests.
#[derive(Default)]
pub struct MemorySink {
    batches: Mutex<Vec<Variables>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every following push until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Accepted batches, oldest first.
    pub fn batches(&self) -> Vec<Variables> {
        self.batches.lock().unwrap().clone()
    }

    /// Value of `name` after applying every accepted batch in order.
    pub fn value(&self, name: &str) -> Option<VariableValue> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|batch| batch.get(name).cloned())
    }

    pub fn clear(&self) {
        self.batches.lock().unwrap().clear();
    }
}

impl VariableSink for MemorySink {
    fn set_variables(&self, variables: &Variables) -> VariableResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VariableError::Rejected("sink marked failing".into()));
        }
        self.batches.lock().unwrap().push(variables.clone());
        Ok(())
    }
}
