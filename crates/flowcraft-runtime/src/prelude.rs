//! Convenient re-exports for common use.

pub use crate::engine::{
    Engine, EngineConfig, EngineConfigBuilder, NodeExecutor, RunContext, RunRequest, RunSelection,
    UpstreamFailurePolicy,
};
pub use crate::error::{CycleError, NodeError, WorkflowError, WorkflowResult};
pub use crate::graph::{Edge, WorkflowDocument, WorkflowGraph};
pub use crate::node::{
    CropImageData, ExtractFrameData, LlmData, Node, NodeId, NodeKind, NodeOutput, NodeResult,
    NodeStatus, NodeType, TextData, UploadImageData, UploadVideoData,
};
pub use crate::run::{
    ExecutionEvent, MemoryRunStore, RunId, RunObserver, RunScope, RunStatus, RunStore, WorkflowRun,
};
pub use crate::session::WorkflowSession;
