//! Live execution events.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use super::{NodeExecutionResult, RunId, WorkflowRun};
use crate::node::NodeId;

/// Tracing target for event delivery.
const TRACING_TARGET: &str = "flowcraft_runtime::run::event";

/// A state change emitted while a run progresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// The run record was created.
    RunStarted {
        /// The new run.
        run: WorkflowRun,
    },
    /// A node began executing.
    NodeStarted {
        /// Owning run.
        run_id: RunId,
        /// Node that started.
        node_id: NodeId,
    },
    /// A node reached a terminal state.
    NodeFinished {
        /// Owning run.
        run_id: RunId,
        /// Final node telemetry.
        result: NodeExecutionResult,
    },
    /// The run reached a terminal state.
    RunCompleted {
        /// The finished run.
        run: WorkflowRun,
    },
}

/// Receives execution events as they happen.
///
/// Called from the scheduler loop, so implementations must not block.
pub trait RunObserver: Send + Sync {
    /// Handles one event.
    fn notify(&self, event: &ExecutionEvent);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn notify(&self, _event: &ExecutionEvent) {}
}

impl RunObserver for UnboundedSender<ExecutionEvent> {
    fn notify(&self, event: &ExecutionEvent) {
        if self.send(event.clone()).is_err() {
            tracing::trace!(target: TRACING_TARGET, "Event receiver dropped");
        }
    }
}
