//! `flowcraft validate`.

use std::path::PathBuf;

use clap::Args;
use flowcraft_runtime::graph::WorkflowGraph;
use flowcraft_runtime::node::{Node, NodeId};
use serde::Serialize;

use super::{print_json, read_document};
use crate::TRACING_TARGET_COMMAND;

/// Arguments of the validate command.
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Workflow document to check
    pub document: PathBuf,
}

/// Validation report printed on stdout.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValidationReport {
    valid: bool,
    node_count: usize,
    edge_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    execution_order: Vec<NodeId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    entry_nodes: Vec<NodeId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exit_nodes: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cycle_path: Vec<NodeId>,
}

impl ValidationReport {
    pub(crate) fn for_graph(graph: &WorkflowGraph) -> Self {
        let ids = |nodes: Vec<&Node>| nodes.into_iter().map(|n| n.id().clone()).collect();

        match graph.execution_order() {
            Ok(order) => Self {
                valid: true,
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
                execution_order: ids(order),
                entry_nodes: ids(graph.entry_nodes()),
                exit_nodes: ids(graph.exit_nodes()),
                error: None,
                cycle_path: Vec::new(),
            },
            Err(cycle) => Self {
                valid: false,
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
                execution_order: Vec::new(),
                entry_nodes: Vec::new(),
                exit_nodes: Vec::new(),
                error: Some(cycle.message),
                cycle_path: cycle.cycle_path,
            },
        }
    }
}

pub(super) async fn execute(args: ValidateArgs) -> anyhow::Result<()> {
    let graph = read_document(&args.document).await?.into_graph()?;
    let report = ValidationReport::for_graph(&graph);

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        document = %args.document.display(),
        valid = report.valid,
        node_count = report.node_count,
        "Workflow validated"
    );

    print_json(&report)?;
    match report.error {
        Some(error) => anyhow::bail!(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use flowcraft_runtime::graph::Edge;
    use flowcraft_runtime::node::{LlmData, TextData};

    use super::*;

    fn graph(edges: Vec<Edge>) -> WorkflowGraph {
        WorkflowGraph::from_parts(
            vec![
                Node::new("a", TextData::new("hi")),
                Node::new("b", LlmData::default()),
            ],
            edges,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_report() {
        let report = ValidationReport::for_graph(&graph(vec![Edge::new("a", "b")]));
        assert!(report.valid);
        assert_eq!(report.execution_order, vec![NodeId::from("a"), NodeId::from("b")]);
        assert_eq!(report.entry_nodes, vec![NodeId::from("a")]);
        assert_eq!(report.exit_nodes, vec![NodeId::from("b")]);
    }

    #[test]
    fn test_cycle_report() {
        let report =
            ValidationReport::for_graph(&graph(vec![Edge::new("a", "b"), Edge::new("b", "a")]));
        assert!(!report.valid);
        assert!(report.error.unwrap().contains("cycle"));
        assert_eq!(report.cycle_path.len(), 3);
    }
}
