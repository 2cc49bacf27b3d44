//! `flowcraft run`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use flowcraft_runtime::WorkflowSession;
use flowcraft_runtime::engine::{Engine, NodeExecutor, RunRequest};
use flowcraft_runtime::node::{NodeId, NodeStatus};
use flowcraft_runtime::run::{ExecutionEvent, RunStatus, WorkflowRun};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{print_json, read_document};
use crate::TRACING_TARGET_COMMAND;
use crate::config::{EngineArgs, ProviderArgs};

/// Arguments of the run command.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Workflow document to run; omit to load `--workflow-id` from the API
    #[arg(required_unless_present = "workflow_id")]
    pub document: Option<PathBuf>,

    /// Stored workflow to load and run
    #[arg(long, env = "FLOWCRAFT_WORKFLOW_ID")]
    pub workflow_id: Option<String>,

    /// Run only these nodes (comma separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "node")]
    pub select: Vec<String>,

    /// Run a single node
    #[arg(long)]
    pub node: Option<String>,

    /// Stream execution events to stderr as JSON lines
    #[arg(long)]
    pub events: bool,

    /// Engine tuning.
    #[clap(flatten)]
    pub engine: EngineArgs,

    /// Provider selection.
    #[clap(flatten)]
    pub provider: ProviderArgs,
}

impl RunArgs {
    fn request(&self) -> RunRequest {
        let request = match (&self.node, self.select.is_empty()) {
            (Some(node), _) => RunRequest::single(node.as_str()),
            (None, false) => RunRequest::selected(self.select.iter().map(String::as_str)),
            (None, true) => RunRequest::full(),
        };

        match &self.workflow_id {
            Some(id) => request.with_workflow_id(id.clone()),
            None => request,
        }
    }
}

/// Per-node line of the run summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeSummary {
    id: NodeId,
    status: NodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run summary printed on stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunSummary {
    run: WorkflowRun,
    nodes: Vec<NodeSummary>,
}

impl RunSummary {
    pub(crate) fn from_session(session: &WorkflowSession, run: WorkflowRun) -> Self {
        let nodes = session
            .graph()
            .nodes()
            .iter()
            .map(|node| {
                let result = session.result(node.id());
                NodeSummary {
                    id: node.id().clone(),
                    status: session.status(node.id()),
                    output: result.and_then(|r| r.output.as_value()).map(str::to_owned),
                    error: result.and_then(|r| r.error.clone()),
                }
            })
            .collect();

        Self { run, nodes }
    }
}

pub(super) async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let services = args.provider.create_services()?;
    let config = args.engine.build()?;

    let mut engine = Engine::new(config, NodeExecutor::new(services.media, services.language))
        .with_store(services.store);

    let mut printer = None;
    if args.events {
        let (sender, receiver) = mpsc::unbounded_channel();
        engine = engine.with_observer(Arc::new(sender));
        printer = Some(spawn_event_printer(receiver));
    }

    let mut session = match (&args.document, &args.workflow_id) {
        (Some(path), workflow_id) => {
            let document = read_document(path).await?;
            let name = document.name.clone();
            let mut session = WorkflowSession::new(engine, document.into_graph()?);
            if let Some(name) = name {
                session = session.with_name(name);
            }
            if let Some(id) = workflow_id {
                session = session.with_workflow_id(id.clone());
            }
            session
        }
        (None, Some(workflow_id)) => WorkflowSession::load(engine, workflow_id)
            .await
            .with_context(|| format!("failed to load workflow {workflow_id}"))?,
        (None, None) => anyhow::bail!("either a document or --workflow-id is required"),
    };

    let cancellation = CancellationToken::new();
    let interrupt = spawn_interrupt_handler(cancellation.clone());

    let request = args.request().with_cancellation(cancellation);
    let outcome = session.run(request).await.map(Clone::clone);
    interrupt.abort();

    let run = outcome.context("workflow run was rejected")?;
    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        run_id = %run.run_id,
        status = %run.status,
        successful_nodes = run.successful_nodes,
        failed_nodes = run.failed_nodes,
        duration_ms = run.duration_ms,
        "Workflow run finished"
    );

    let status = run.status;
    print_json(&RunSummary::from_session(&session, run))?;

    drop(session);
    if let Some(printer) = printer {
        printer.await.context("event printer failed")?;
    }

    if status == RunStatus::Failed {
        anyhow::bail!("workflow run failed");
    }
    Ok(())
}

/// Prints every event as a JSON line on stderr until the engine is dropped.
fn spawn_event_printer(mut receiver: mpsc::UnboundedReceiver<ExecutionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => eprintln!("{line}"),
                Err(error) => tracing::warn!(
                    target: TRACING_TARGET_COMMAND,
                    error = %error,
                    "Failed to encode execution event"
                ),
            }
        }
    })
}

/// Cancels the run on Ctrl-C.
fn spawn_interrupt_handler(cancellation: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(
                target: TRACING_TARGET_COMMAND,
                "Interrupt received, cancelling run"
            );
            cancellation.cancel();
        }
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use flowcraft_runtime::engine::RunSelection;
    use flowcraft_runtime::graph::{Edge, WorkflowGraph};
    use flowcraft_runtime::node::{LlmData, Node, TextData};
    use flowcraft_test::{create_mock_language_service, create_mock_media_service};

    use super::*;
    use crate::command::Command;
    use crate::config::Cli;

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["flowcraft", "run"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_request_selection() {
        assert_eq!(parse(&["w.json"]).request().selection, RunSelection::Full);
        assert_eq!(
            parse(&["w.json", "--node", "llm"]).request().selection,
            RunSelection::Single("llm".into())
        );
        assert_eq!(
            parse(&["w.json", "--select", "a,b"]).request().selection,
            RunSelection::Selected(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_document_or_workflow_required() {
        let result = Cli::try_parse_from(["flowcraft", "run", "--mock"]);
        assert!(result.is_err());

        let args = parse(&["--workflow-id", "wf-1"]);
        assert_eq!(args.request().workflow_id.as_deref(), Some("wf-1"));
    }

    #[tokio::test]
    async fn test_summary_lists_every_node() {
        let graph = WorkflowGraph::from_parts(
            vec![
                Node::new("prompt", TextData::new("caption this")),
                Node::new("llm", LlmData::default()),
                Node::new("idle", LlmData::new("untouched")),
            ],
            vec![Edge::new("prompt", "llm")],
        )
        .unwrap();
        let engine = Engine::with_defaults(NodeExecutor::new(
            create_mock_media_service(),
            create_mock_language_service(),
        ));
        let mut session = WorkflowSession::new(engine, graph);

        let run = session
            .run(RunRequest::selected(["prompt", "llm"]))
            .await
            .unwrap()
            .clone();
        let summary = RunSummary::from_session(&session, run);

        assert_eq!(summary.nodes.len(), 3);
        assert_eq!(summary.nodes[1].output.as_deref(), Some("ECHO: caption this"));
        assert_eq!(summary.nodes[2].status, NodeStatus::Idle);
        assert_eq!(summary.run.total_nodes, 2);
    }

    #[tokio::test]
    async fn test_run_document_with_mocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.json");
        std::fs::write(
            &path,
            r#"{
                "name": "Caption",
                "nodes": [
                    {"id": "prompt", "type": "text", "data": {"value": "hello"}},
                    {"id": "llm", "type": "llm", "data": {}}
                ],
                "edges": [{"id": "e1", "source": "prompt", "target": "llm"}]
            }"#,
        )
        .unwrap();

        let args = parse(&[path.to_str().unwrap(), "--mock"]);
        execute(args).await.unwrap();
    }
}
