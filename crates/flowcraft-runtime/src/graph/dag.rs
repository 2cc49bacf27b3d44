//! Acyclicity checks and topological ordering.
//!
//! These functions take plain node and edge slices so they can run on any
//! projection of a workflow. Edges whose endpoints are not among `nodes` are
//! ignored.

use std::collections::{HashMap, VecDeque};

use petgraph::Direction::{Incoming, Outgoing};
use petgraph::algo::is_cyclic_directed;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::NodeIndexable;

use crate::error::CycleError;
use crate::graph::Edge;
use crate::node::{Node, NodeId};

/// Dependency graph over borrowed nodes.
///
/// Node indices follow the order of the node slice. Parallel edges are kept,
/// so degrees count edges rather than distinct neighbours.
pub(crate) struct DependencyGraph<'a> {
    graph: StableDiGraph<&'a Node, ()>,
    indices: HashMap<&'a NodeId, NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    /// Builds the graph, skipping edges with an unknown endpoint.
    pub fn build(nodes: &'a [Node], edges: &[Edge]) -> Self {
        let mut graph = StableDiGraph::with_capacity(nodes.len(), edges.len());
        let mut indices = HashMap::with_capacity(nodes.len());

        for node in nodes {
            let index = graph.add_node(node);
            indices.insert(node.id(), index);
        }

        for edge in edges {
            let source = indices.get(&edge.source).copied();
            let target = indices.get(&edge.target).copied();
            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };
            graph.add_edge(source, target, ());
        }

        Self { graph, indices }
    }

    /// Returns every node index, in node order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Returns the node at `index`.
    pub fn node(&self, index: NodeIndex) -> &'a Node {
        self.graph[index]
    }

    /// Returns the index of a node.
    pub fn index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.indices.get(id).copied()
    }

    /// Returns the number of edges into a node.
    pub fn in_degree(&self, index: NodeIndex) -> usize {
        self.graph.neighbors_directed(index, Incoming).count()
    }

    /// Returns the targets of a node's outgoing edges, once per edge.
    pub fn dependents(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(index, Outgoing)
    }

    /// Fails with the first cycle found.
    pub fn check_acyclic(&self) -> Result<(), CycleError> {
        if !is_cyclic_directed(&self.graph) {
            return Ok(());
        }

        match self.find_cycle() {
            Some(path) => Err(CycleError::from_path(path)),
            None => Ok(()),
        }
    }

    /// Runs a depth-first search from every unvisited node. On the first back
    /// edge the cycle is the suffix of the current DFS path starting at the
    /// revisited node, closed by repeating that node.
    fn find_cycle(&self) -> Option<Vec<NodeId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.graph.node_bound()];
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut stack = Vec::new();

        for start in self.graph.node_indices() {
            if marks[start.index()] != Mark::Unvisited {
                continue;
            }

            marks[start.index()] = Mark::OnStack;
            path.push(start);
            stack.push(self.graph.neighbors_directed(start, Outgoing));

            while let Some(neighbors) = stack.last_mut() {
                let Some(next) = neighbors.next() else {
                    if let Some(done) = path.pop() {
                        marks[done.index()] = Mark::Done;
                    }
                    stack.pop();
                    continue;
                };

                match marks[next.index()] {
                    Mark::Unvisited => {
                        marks[next.index()] = Mark::OnStack;
                        path.push(next);
                        stack.push(self.graph.neighbors_directed(next, Outgoing));
                    }
                    Mark::OnStack => {
                        let from = path.iter().rposition(|&n| n == next).unwrap_or(0);
                        let mut cycle: Vec<NodeId> = path[from..]
                            .iter()
                            .map(|&n| self.node(n).id().clone())
                            .collect();
                        cycle.push(self.node(next).id().clone());
                        return Some(cycle);
                    }
                    Mark::Done => {}
                }
            }
        }

        None
    }
}

/// Checks that the graph has no cycle.
///
/// The returned [`CycleError`] carries a closed path along real edges.
pub fn validate_dag(nodes: &[Node], edges: &[Edge]) -> Result<(), CycleError> {
    DependencyGraph::build(nodes, edges).check_acyclic()
}

/// Returns the nodes in an order where every edge's source precedes its
/// target.
///
/// Ties between nodes that become ready together carry no meaning.
pub fn execution_order<'a>(nodes: &'a [Node], edges: &[Edge]) -> Result<Vec<&'a Node>, CycleError> {
    let dag = DependencyGraph::build(nodes, edges);
    dag.check_acyclic()?;

    let mut in_degree: HashMap<NodeIndex, usize> = dag
        .node_indices()
        .map(|index| (index, dag.in_degree(index)))
        .collect();
    let mut queue: VecDeque<NodeIndex> = dag
        .node_indices()
        .filter(|index| in_degree[index] == 0)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(index) = queue.pop_front() {
        order.push(dag.node(index));

        for next in dag.dependents(index) {
            if let Some(degree) = in_degree.get_mut(&next) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if order.len() < nodes.len() {
        let stuck = dag
            .node_indices()
            .filter(|index| in_degree[index] > 0)
            .map(|index| dag.node(index).id().clone())
            .collect();
        return Err(CycleError::from_stuck(stuck));
    }

    Ok(order)
}

/// Returns nodes with no incoming edges.
pub fn entry_nodes<'a>(nodes: &'a [Node], edges: &[Edge]) -> Vec<&'a Node> {
    let dag = DependencyGraph::build(nodes, edges);
    dag.node_indices()
        .filter(|&index| dag.in_degree(index) == 0)
        .map(|index| dag.node(index))
        .collect()
}

/// Returns nodes with no outgoing edges.
pub fn exit_nodes<'a>(nodes: &'a [Node], edges: &[Edge]) -> Vec<&'a Node> {
    let dag = DependencyGraph::build(nodes, edges);
    dag.node_indices()
        .filter(|&index| dag.dependents(index).next().is_none())
        .map(|index| dag.node(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::node::TextData;

    /// Small deterministic generator for layered test graphs.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn below(&mut self, bound: usize) -> usize {
            (self.next() % bound as u64) as usize
        }
    }

    fn text(id: &str) -> Node {
        Node::new(id, TextData::new(id))
    }

    /// Builds a graph whose edges only point from lower to higher layers.
    fn layered_graph(seed: u64, layers: usize, width: usize) -> (Vec<Node>, Vec<Edge>) {
        let mut rng = Lcg(seed);
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for layer in 0..layers {
            for slot in 0..width {
                let id = format!("n{layer}_{slot}");
                if layer > 0 {
                    for _ in 0..rng.below(3) {
                        let from_layer = rng.below(layer);
                        let from = format!("n{from_layer}_{}", rng.below(width));
                        edges.push(Edge::new(from.as_str(), id.as_str()));
                    }
                }
                nodes.push(text(&id));
            }
        }

        // Shuffle node order so the input order is not already topological.
        for i in (1..nodes.len()).rev() {
            let j = rng.below(i + 1);
            nodes.swap(i, j);
        }

        (nodes, edges)
    }

    fn assert_valid_order(nodes: &[Node], edges: &[Edge], order: &[&Node]) {
        assert_eq!(order.len(), nodes.len());
        let position: HashMap<&NodeId, usize> = order
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id(), i))
            .collect();
        assert_eq!(position.len(), nodes.len());

        for edge in edges {
            assert!(
                position[&edge.source] < position[&edge.target],
                "{} must precede {}",
                edge.source,
                edge.target
            );
        }
    }

    fn assert_real_cycle(edges: &[Edge], error: &CycleError) {
        let path = &error.cycle_path;
        assert!(path.len() >= 2);
        assert_eq!(path.first(), path.last());
        for pair in path.windows(2) {
            assert!(
                edges
                    .iter()
                    .any(|e| e.source == pair[0] && e.target == pair[1]),
                "{} -> {} is not an edge",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_order_respects_every_edge() {
        for seed in 0..50 {
            let (nodes, edges) = layered_graph(seed, 6, 4);
            assert!(validate_dag(&nodes, &edges).is_ok());
            let order = execution_order(&nodes, &edges).unwrap();
            assert_valid_order(&nodes, &edges, &order);
        }
    }

    #[test]
    fn test_reordered_inputs_give_valid_orders() {
        let (mut nodes, edges) = layered_graph(7, 5, 5);
        for _ in 0..10 {
            nodes.rotate_left(3);
            let order = execution_order(&nodes, &edges).unwrap();
            assert_valid_order(&nodes, &edges, &order);

            let reordered: Vec<Node> = order.into_iter().cloned().collect();
            assert!(validate_dag(&reordered, &edges).is_ok());
        }
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        for seed in 0..30 {
            let (nodes, mut edges) = layered_graph(seed, 5, 3);
            // Close a loop from the last layer back into the first.
            edges.push(Edge::new("n0_0", "n4_0"));
            edges.push(Edge::new("n4_0", "n2_1"));
            edges.push(Edge::new("n2_1", "n0_0"));

            let error = validate_dag(&nodes, &edges).unwrap_err();
            assert_real_cycle(&edges, &error);

            let error = execution_order(&nodes, &edges).unwrap_err();
            assert_real_cycle(&edges, &error);
        }
    }

    #[test]
    fn test_self_loop() {
        let nodes = vec![text("a")];
        let edges = vec![Edge::new("a", "a")];
        let error = validate_dag(&nodes, &edges).unwrap_err();
        assert_eq!(error.cycle_path, vec![NodeId::from("a"), NodeId::from("a")]);
    }

    #[test]
    fn test_minimal_cycle_suffix() {
        let nodes = vec![text("a"), text("b"), text("c"), text("d")];
        let edges = vec![
            Edge::new("a", "b"),
            Edge::new("b", "c"),
            Edge::new("c", "d"),
            Edge::new("d", "b"),
        ];
        let error = validate_dag(&nodes, &edges).unwrap_err();
        let path: Vec<&str> = error.cycle_path.iter().map(NodeId::as_str).collect();
        assert_eq!(path, vec!["b", "c", "d", "b"]);
        assert_eq!(error.message, "workflow contains a cycle: b -> c -> d -> b");
    }

    #[test]
    fn test_entry_and_exit_nodes() {
        let nodes = vec![text("a"), text("b"), text("c"), text("lonely")];
        let edges = vec![Edge::new("a", "b"), Edge::new("b", "c"), Edge::new("a", "c")];

        let entries: Vec<&str> = entry_nodes(&nodes, &edges)
            .iter()
            .map(|n| n.id().as_str())
            .collect();
        let exits: Vec<&str> = exit_nodes(&nodes, &edges)
            .iter()
            .map(|n| n.id().as_str())
            .collect();

        assert_eq!(entries, vec!["a", "lonely"]);
        assert_eq!(exits, vec!["c", "lonely"]);
    }

    #[test]
    fn test_dangling_edges_ignored() {
        let nodes = vec![text("a"), text("b")];
        let edges = vec![Edge::new("a", "b"), Edge::new("ghost", "a")];
        let order = execution_order(&nodes, &edges).unwrap();
        assert_eq!(order[0].id().as_str(), "a");
        assert_eq!(entry_nodes(&nodes, &edges).len(), 1);
    }

    #[test]
    fn test_parallel_edges_count_per_edge() {
        let nodes = vec![text("a"), text("b"), text("c")];
        let edges = vec![Edge::new("a", "c"), Edge::new("a", "c"), Edge::new("b", "c")];

        let dag = DependencyGraph::build(&nodes, &edges);
        let c = dag.index(&NodeId::from("c")).unwrap();
        assert_eq!(dag.in_degree(c), 3);

        let a = dag.index(&NodeId::from("a")).unwrap();
        assert_eq!(dag.dependents(a).filter(|&next| next == c).count(), 2);

        let order: Vec<&str> = execution_order(&nodes, &edges)
            .unwrap()
            .iter()
            .map(|n| n.id().as_str())
            .collect();
        assert_eq!(order.last(), Some(&"c"));
    }

    #[test]
    fn test_graph_indices_follow_node_order() {
        let nodes = vec![text("z"), text("y"), text("x")];
        let dag = DependencyGraph::build(&nodes, &[]);
        let ids: Vec<&str> = dag
            .node_indices()
            .map(|index| dag.node(index).id().as_str())
            .collect();
        assert_eq!(ids, vec!["z", "y", "x"]);
        assert!(dag.index(&NodeId::from("ghost")).is_none());
    }
}
