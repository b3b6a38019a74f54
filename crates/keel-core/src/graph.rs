//! A small directed dependency graph with topological ordering.
//!
//! An edge `from -> to` states that `from` must be processed before `to`.
//! The graph knows nothing about persistence; the domain builder uses it to
//! order type definitions and the upgrade machinery uses it to order upgrade
//! handlers.

use index_vec::IndexVec;
use indexmap::{IndexMap, IndexSet};
use std::{fmt, hash::Hash, ops};

index_vec::define_index_type! {
    pub struct NodeId = u32;
}

index_vec::define_index_type! {
    pub struct EdgeId = u32;
}

#[derive(Debug, Clone)]
pub struct Graph<T> {
    nodes: IndexVec<NodeId, Node<T>>,
    edges: IndexVec<EdgeId, Edge>,

    /// Maps node values to their identifiers.
    lookup: IndexMap<T, NodeId>,
}

#[derive(Debug, Clone)]
pub struct Node<T> {
    pub value: T,

    /// Edges leaving this node, i.e. nodes that depend on it.
    pub outgoing: IndexSet<EdgeId>,

    /// Edges entering this node, i.e. nodes it depends on.
    pub incoming: IndexSet<EdgeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: EdgeWeight,
}

/// Ordering hint for edges. When several dependencies of a node are pending,
/// heavier edges are visited first. Weights never affect correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EdgeWeight {
    Low,
    #[default]
    Normal,
    High,
}

/// The nodes that prevented a topological ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<T> {
    pub nodes: Vec<T>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl<T: Clone + Eq + Hash> Graph<T> {
    pub fn new() -> Self {
        Self {
            nodes: IndexVec::new(),
            edges: IndexVec::new(),
            lookup: IndexMap::new(),
        }
    }

    /// Adds a node, returning the existing identifier if the value is already present.
    pub fn add_node(&mut self, value: T) -> NodeId {
        if let Some(id) = self.lookup.get(&value) {
            return *id;
        }

        let id = self.nodes.push(Node {
            value: value.clone(),
            outgoing: IndexSet::new(),
            incoming: IndexSet::new(),
        });
        self.lookup.insert(value, id);
        id
    }

    /// Adds an edge stating that `from` must precede `to`. Missing nodes are
    /// created. Adding an existing edge keeps the heavier weight.
    pub fn add_edge(&mut self, from: T, to: T, weight: EdgeWeight) -> EdgeId {
        let from = self.add_node(from);
        let to = self.add_node(to);

        let existing = self.nodes[from]
            .outgoing
            .iter()
            .copied()
            .find(|edge| self.edges[*edge].to == to);

        if let Some(existing) = existing {
            let edge = &mut self.edges[existing];
            edge.weight = edge.weight.max(weight);
            return existing;
        }

        let id = self.edges.push(Edge { from, to, weight });
        self.nodes[from].outgoing.insert(id);
        self.nodes[to].incoming.insert(id);
        id
    }

    pub fn node_id(&self, value: &T) -> Option<NodeId> {
        self.lookup.get(value).copied()
    }

    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node<T>> + '_ {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl ExactSizeIterator<Item = &Edge> + '_ {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns all node values ordered so that every edge's source precedes
    /// its target, or the nodes forming a cycle.
    ///
    /// Nodes are visited in insertion order, so independent nodes keep their
    /// relative insertion order.
    pub fn topological_sort(&self) -> Result<Vec<T>, Cycle<T>> {
        let mut marks: IndexVec<NodeId, Mark> =
            IndexVec::from_vec(vec![Mark::Unvisited; self.nodes.len()]);
        let mut stack = vec![];
        let mut order = Vec::with_capacity(self.nodes.len());

        for node_id in self.nodes.indices() {
            self.visit(node_id, &mut marks, &mut stack, &mut order)?;
        }

        Ok(order
            .into_iter()
            .map(|node_id| self.nodes[node_id].value.clone())
            .collect())
    }

    fn visit(
        &self,
        node_id: NodeId,
        marks: &mut IndexVec<NodeId, Mark>,
        stack: &mut Vec<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), Cycle<T>> {
        match marks[node_id] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                // Back edge: everything on the stack from the first visit of
                // this node onwards is part of the loop.
                let start = stack
                    .iter()
                    .position(|id| *id == node_id)
                    .unwrap_or_default();

                return Err(Cycle {
                    nodes: stack[start..]
                        .iter()
                        .map(|id| self.nodes[*id].value.clone())
                        .collect(),
                });
            }
            Mark::Unvisited => {}
        }

        marks[node_id] = Mark::InProgress;
        stack.push(node_id);

        let mut deps: Vec<&Edge> = self.nodes[node_id]
            .incoming
            .iter()
            .map(|edge_id| &self.edges[*edge_id])
            .collect();
        deps.sort_by(|a, b| b.weight.cmp(&a.weight));

        for edge in deps {
            self.visit(edge.from, marks, stack, order)?;
        }

        stack.pop();
        marks[node_id] = Mark::Done;
        order.push(node_id);

        Ok(())
    }
}

impl<T: Clone + Eq + Hash> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ops::Index<NodeId> for Graph<T> {
    type Output = Node<T>;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

impl<T: fmt::Display> fmt::Display for Cycle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[&str], value: &str) -> usize {
        order.iter().position(|v| *v == value).unwrap()
    }

    #[test]
    fn sorts_dependencies_first() {
        let mut graph = Graph::new();
        graph.add_edge("b", "c", EdgeWeight::Normal);
        graph.add_edge("a", "b", EdgeWeight::Normal);
        graph.add_node("d");

        let order = graph.topological_sort().unwrap();
        assert_eq!(order.len(), 4);
        assert!(position(&order, "a") < position(&order, "b"));
        assert!(position(&order, "b") < position(&order, "c"));
    }

    #[test]
    fn independent_nodes_keep_insertion_order() {
        let mut graph = Graph::new();
        for value in ["x", "y", "z"] {
            graph.add_node(value);
        }

        assert_eq!(graph.topological_sort().unwrap(), ["x", "y", "z"]);
    }

    #[test]
    fn heavier_dependencies_are_emitted_first() {
        let mut graph = Graph::new();
        graph.add_node("target");
        graph.add_edge("low", "target", EdgeWeight::Low);
        graph.add_edge("high", "target", EdgeWeight::High);

        let order = graph.topological_sort().unwrap();
        assert_eq!(order, ["high", "low", "target"]);
    }

    #[test]
    fn duplicate_edges_keep_heaviest_weight() {
        let mut graph = Graph::new();
        let first = graph.add_edge("a", "b", EdgeWeight::Low);
        let second = graph.add_edge("a", "b", EdgeWeight::High);

        assert_eq!(first, second);
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges().next().unwrap().weight, EdgeWeight::High);
    }

    #[test]
    fn reports_nodes_of_cycle() {
        let mut graph = Graph::new();
        graph.add_node("outside");
        graph.add_edge("a", "b", EdgeWeight::Normal);
        graph.add_edge("b", "c", EdgeWeight::Normal);
        graph.add_edge("c", "a", EdgeWeight::Normal);

        let cycle = graph.topological_sort().unwrap_err();
        let mut nodes = cycle.nodes.clone();
        nodes.sort();
        assert_eq!(nodes, ["a", "b", "c"]);
        assert!(!cycle.nodes.contains(&"outside"));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = Graph::new();
        graph.add_edge("a", "a", EdgeWeight::Normal);

        assert_eq!(graph.topological_sort().unwrap_err().nodes, ["a"]);
    }
}
