//! Variable sync with Karabiner-Elements.
//!
//! Values are staged locally and pushed as diffed batches through the
//! `karabiner_cli` tool. The override mode is read back from the engine's
//! environment file.

mod env_file;
mod error;
mod names;
mod sink;
mod store;
mod value;
mod worker;

pub use env_file::{EnvironmentFile, DEFAULT_ENVIRONMENT_PATH};
pub use error::{VariableError, VariableResult};
pub use names::{VariableNames, DEFAULT_PREFIX};
pub use sink::{
    KarabinerCli, MemorySink, VariableSink, VariableSinkRef, Variables, DEFAULT_CLI_PATH,
};
pub use store::{PushBatch, VariableStore};
pub use value::VariableValue;
pub use worker::{PushOutcome, PushQueue, PushWorker};
