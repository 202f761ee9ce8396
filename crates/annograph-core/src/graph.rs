//! The similarity graph: nodes, weighted undirected edges, adjacency.
//!
//! Storage follows the edge-list-plus-index layout: each unordered
//! pair is stored exactly once (endpoint ids ascending), and a
//! per-node adjacency index carries incident edge ids for both
//! endpoints so neighbor enumeration never scans the edge list.

use crate::intern::FeatureInterner;
use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One node per entity with a non-empty feature set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Entity identifier this node was built from.
    pub id: String,
    /// Interned feature ids. Read-only after construction.
    pub features: RoaringBitmap,
    /// Ground-truth labels from the entity source. Never written by
    /// propagation.
    pub labels: BTreeSet<String>,
    /// Propagation output slot: ranked `(label, confidence)` pairs.
    /// Stays empty for nodes that arrive labeled.
    pub predicted_labels: Vec<(String, f64)>,
}

impl Node {
    pub fn is_labeled(&self) -> bool {
        !self.labels.is_empty()
    }

    pub fn has_predictions(&self) -> bool {
        !self.predicted_labels.is_empty()
    }
}

/// Undirected weighted edge between two nodes, stored once with
/// `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: u32,
    pub b: u32,
    pub weight: f64,
}

impl Edge {
    /// The endpoint that is not `node`.
    pub fn other(&self, node: u32) -> u32 {
        if node == self.a {
            self.b
        } else {
            self.a
        }
    }
}

/// Weighted undirected similarity graph for one build run.
///
/// Simple by construction: no self-loops, no duplicate edges for an
/// unordered pair, every weight strictly above the build threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityGraph {
    threshold: f64,
    interner: FeatureInterner,
    nodes: Vec<Node>,
    id_index: AHashMap<String, u32>,
    edges: Vec<Edge>,
    /// node id -> incident edge ids, in edge insertion order.
    adjacency: Vec<Vec<u32>>,
}

impl SimilarityGraph {
    pub(crate) fn new(threshold: f64, interner: FeatureInterner, nodes: Vec<Node>) -> Self {
        let id_index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i as u32))
            .collect();
        let adjacency = vec![Vec::new(); nodes.len()];
        Self {
            threshold,
            interner,
            nodes,
            id_index,
            edges: Vec::new(),
            adjacency,
        }
    }

    /// Insert an edge. Endpoints must be distinct, ascending, and not
    /// already connected; the builder upholds this by generating each
    /// unordered pair once.
    pub(crate) fn add_edge(&mut self, a: u32, b: u32, weight: f64) {
        debug_assert!(a < b, "edges are stored with ascending endpoints");
        let edge_id = self.edges.len() as u32;
        self.edges.push(Edge { a, b, weight });
        self.adjacency[a as usize].push(edge_id);
        self.adjacency[b as usize].push(edge_id);
    }

    /// The similarity threshold this graph was built with.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Resolve an entity identifier to its node id.
    pub fn node_id(&self, entity_id: &str) -> Option<u32> {
        self.id_index.get(entity_id).copied()
    }

    pub fn node_by_entity_id(&self, entity_id: &str) -> Option<&Node> {
        self.node_id(entity_id).and_then(|id| self.node(id))
    }

    /// Incident `(neighbor, weight)` pairs for a node, in edge
    /// insertion order.
    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.adjacency
            .get(node as usize)
            .into_iter()
            .flatten()
            .map(move |&edge_id| {
                let edge = &self.edges[edge_id as usize];
                (edge.other(node), edge.weight)
            })
    }

    pub fn degree(&self, node: u32) -> usize {
        self.adjacency
            .get(node as usize)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Resolve a node's interned feature ids back to tokens, in
    /// bitmap (ascending id) order.
    pub fn feature_tokens(&self, node: u32) -> Vec<&str> {
        let Some(n) = self.node(node) else {
            return Vec::new();
        };
        n.features
            .iter()
            .filter_map(|id| self.interner.lookup(id))
            .collect()
    }

    pub fn interner(&self) -> &FeatureInterner {
        &self.interner
    }

    pub fn labeled_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_labeled()).count()
    }

    pub fn unlabeled_count(&self) -> usize {
        self.nodes.len() - self.labeled_count()
    }

    /// Mean degree over all nodes (0.0 for an empty graph).
    pub fn average_degree(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        (2 * self.edges.len()) as f64 / self.nodes.len() as f64
    }

    /// Attach ranked predictions to a node. Panics in debug builds if
    /// the node already carries ground-truth labels; the propagator
    /// never selects such nodes.
    pub(crate) fn set_predictions(&mut self, node: u32, predictions: Vec<(String, f64)>) {
        let n = &mut self.nodes[node as usize];
        debug_assert!(!n.is_labeled(), "labeled nodes never receive predictions");
        n.predicted_labels = predictions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_graph() -> SimilarityGraph {
        let mut interner = FeatureInterner::new();
        let f1: RoaringBitmap = [interner.intern("d1")].into_iter().collect();
        let f2: RoaringBitmap = [interner.intern("d2")].into_iter().collect();
        let nodes = vec![
            Node {
                id: "A".into(),
                features: f1,
                labels: BTreeSet::from(["1.1.1.1".to_string()]),
                predicted_labels: Vec::new(),
            },
            Node {
                id: "B".into(),
                features: f2,
                labels: BTreeSet::new(),
                predicted_labels: Vec::new(),
            },
        ];
        SimilarityGraph::new(0.1, interner, nodes)
    }

    #[test]
    fn adjacency_serves_both_directions_of_one_stored_edge() {
        let mut g = two_node_graph();
        g.add_edge(0, 1, 0.5);

        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.neighbors(0).collect::<Vec<_>>(), vec![(1, 0.5)]);
        assert_eq!(g.neighbors(1).collect::<Vec<_>>(), vec![(0, 0.5)]);
        assert_eq!(g.degree(0), 1);
    }

    #[test]
    fn entity_id_lookup() {
        let g = two_node_graph();
        assert_eq!(g.node_id("B"), Some(1));
        assert_eq!(g.node_id("missing"), None);
        assert!(g.node_by_entity_id("A").unwrap().is_labeled());
    }

    #[test]
    fn counts_and_average_degree() {
        let mut g = two_node_graph();
        assert_eq!(g.labeled_count(), 1);
        assert_eq!(g.unlabeled_count(), 1);
        g.add_edge(0, 1, 0.5);
        assert!((g.average_degree() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn feature_tokens_resolve_through_interner() {
        let g = two_node_graph();
        assert_eq!(g.feature_tokens(0), vec!["d1"]);
        assert_eq!(g.feature_tokens(1), vec!["d2"]);
    }
}
