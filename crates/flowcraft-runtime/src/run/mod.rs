//! Run records, persistence and live reporting.

mod event;
mod id;
mod memory;
mod record;
mod reporter;
mod store;

pub use event::{ExecutionEvent, NoopObserver, RunObserver};
pub use id::RunId;
pub use memory::{DEFAULT_HISTORY_LIMIT, MemoryRunStore};
pub use record::{NodeExecutionResult, RunScope, RunStatus, WorkflowRun};
pub use reporter::RunReporter;
pub use store::{NewRun, NodeExecutionUpdate, RunCompletion, RunStore, StoredWorkflow};
