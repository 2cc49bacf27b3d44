//! Input resolution along incoming edges.

use std::collections::HashMap;

use url::Url;

use crate::graph::WorkflowGraph;
use crate::node::{Aggregation, InputSlot, Node, NodeId, NodeResult};

/// Resolves a node's slot values from the graph and the results so far.
///
/// For every edge into a slot the upstream result's output is used when
/// present, otherwise the upstream node's stored value. Null values are
/// dropped. Once any edge feeds a slot, the node's local field for that slot
/// is ignored.
pub(crate) struct InputResolver<'a> {
    graph: &'a WorkflowGraph,
    node: &'a Node,
    results: &'a HashMap<NodeId, NodeResult>,
}

impl<'a> InputResolver<'a> {
    pub fn new(
        graph: &'a WorkflowGraph,
        node: &'a Node,
        results: &'a HashMap<NodeId, NodeResult>,
    ) -> Self {
        Self {
            graph,
            node,
            results,
        }
    }

    /// Text slot: newline-joined values in edge order, or `local` when unwired.
    pub fn text(&self, slot: InputSlot, local: &str) -> String {
        debug_assert_eq!(slot.aggregation(), Aggregation::Concatenate);
        match self.wired_values(slot) {
            Some(values) => values.join("\n"),
            None => local.to_owned(),
        }
    }

    /// Media slot: first usable URL in edge order, or the local URL when unwired.
    pub fn first_url(&self, slot: InputSlot, local: Option<&str>) -> Option<Url> {
        debug_assert_eq!(slot.aggregation(), Aggregation::First);
        match self.wired_values(slot) {
            Some(values) => values.into_iter().find_map(http_url),
            None => local.and_then(http_url),
        }
    }

    /// List slot: every usable URL in edge order.
    pub fn urls(&self, slot: InputSlot) -> Vec<Url> {
        debug_assert_eq!(slot.aggregation(), Aggregation::Collect);
        self.wired_values(slot)
            .unwrap_or_default()
            .into_iter()
            .filter_map(http_url)
            .collect()
    }

    /// Values arriving on `slot`, or `None` when no edge targets it.
    fn wired_values(&self, slot: InputSlot) -> Option<Vec<&'a str>> {
        let node_type = self.node.node_type();
        let mut wired = false;
        let mut values = Vec::new();

        for edge in self.graph.incoming_edges(self.node.id()) {
            if node_type.slot_for_handle(edge.target_handle.as_deref()) != Some(slot) {
                continue;
            }
            wired = true;

            let value = self
                .results
                .get(&edge.source)
                .and_then(|result| result.output.as_value())
                .or_else(|| {
                    self.graph
                        .node(&edge.source)
                        .and_then(|source| source.kind().stored_value())
                });

            if let Some(value) = value {
                values.push(value);
            }
        }

        wired.then_some(values)
    }
}

/// Parses an absolute `http` or `https` URL.
fn http_url(value: &str) -> Option<Url> {
    Url::parse(value.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
