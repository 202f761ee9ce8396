//! Similarity-graph construction.
//!
//! Quadratic pairwise Jaccard over interned feature bitmaps. The
//! pairwise phase is embarrassingly parallel: each outer row is
//! computed independently on the rayon pool and per-row edge vectors
//! are merged in row order, so the resulting edge list is
//! deterministic for a given input order.

use crate::entity::Entity;
use crate::error::AnnographError;
use crate::graph::{Node, SimilarityGraph};
use crate::intern::FeatureInterner;
use crate::similarity::jaccard;
use rayon::prelude::*;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default minimum Jaccard similarity for edge creation.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.1;

/// Counters accumulated over one build run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Entities offered by the source.
    pub entities_seen: usize,
    /// Entities dropped for having no feature tokens.
    pub entities_skipped: usize,
    pub nodes_created: usize,
    pub labeled_nodes: usize,
    pub unlabeled_nodes: usize,
    /// Unordered pairs compared.
    pub comparisons: usize,
    pub edges_created: usize,
}

/// Result of one build run: the graph plus its counters.
#[derive(Debug, Clone)]
pub struct GraphBuild {
    pub graph: SimilarityGraph,
    pub stats: BuildStats,
}

/// Builds a weighted undirected similarity graph from entities.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder {
    threshold: f64,
}

impl GraphBuilder {
    /// Create a builder. The threshold must lie in `[0, 1)`; an edge
    /// is created only for pairs scoring **strictly above** it, so a
    /// threshold of 1.0 could never produce an edge.
    pub fn new(threshold: f64) -> Result<Self, AnnographError> {
        if !(0.0..1.0).contains(&threshold) || threshold.is_nan() {
            return Err(AnnographError::InvalidThreshold { value: threshold });
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Build the graph. Fewer than two qualifying entities degrade to
    /// an edgeless (possibly empty) graph, not an error. The entity
    /// source is never mutated.
    pub fn build(&self, entities: &[Entity]) -> GraphBuild {
        let mut stats = BuildStats {
            entities_seen: entities.len(),
            ..BuildStats::default()
        };

        let mut interner = FeatureInterner::new();
        let mut nodes: Vec<Node> = Vec::new();
        for entity in entities {
            if entity.features.is_empty() {
                stats.entities_skipped += 1;
                continue;
            }
            let features: RoaringBitmap = entity
                .features
                .iter()
                .map(|token| interner.intern(token))
                .collect();
            if entity.is_labeled() {
                stats.labeled_nodes += 1;
            } else {
                stats.unlabeled_nodes += 1;
            }
            nodes.push(Node {
                id: entity.id.clone(),
                features,
                labels: entity.labels.clone(),
                predicted_labels: Vec::new(),
            });
        }
        stats.nodes_created = nodes.len();

        info!(
            nodes = stats.nodes_created,
            skipped = stats.entities_skipped,
            labeled = stats.labeled_nodes,
            unlabeled = stats.unlabeled_nodes,
            "filtered entities into nodes"
        );

        let n = nodes.len();
        stats.comparisons = n * n.saturating_sub(1) / 2;
        let threshold = self.threshold;

        // Each row i compares against j in (i, n); rows are
        // independent and collected in row order for determinism.
        let rows: Vec<Vec<(u32, u32, f64)>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut row = Vec::new();
                for j in (i + 1)..n {
                    let weight = jaccard(&nodes[i].features, &nodes[j].features);
                    if weight > threshold {
                        row.push((i as u32, j as u32, weight));
                    }
                }
                row
            })
            .collect();

        let mut graph = SimilarityGraph::new(threshold, interner, nodes);
        for (a, b, weight) in rows.into_iter().flatten() {
            graph.add_edge(a, b, weight);
        }
        stats.edges_created = graph.edge_count();

        debug!(
            comparisons = stats.comparisons,
            edges = stats.edges_created,
            threshold,
            "pairwise phase complete"
        );

        GraphBuild { graph, stats }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn entity(id: &str, features: &[&str], labels: &[&str]) -> Entity {
        Entity::new(id)
            .with_features(features.iter().copied())
            .with_labels(labels.iter().copied())
    }

    #[test]
    fn rejects_threshold_outside_range() {
        assert!(matches!(
            GraphBuilder::new(-0.01),
            Err(AnnographError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            GraphBuilder::new(1.0),
            Err(AnnographError::InvalidThreshold { .. })
        ));
        assert!(GraphBuilder::new(0.0).is_ok());
        assert!(GraphBuilder::new(0.999).is_ok());
    }

    #[test]
    fn empty_feature_entities_are_excluded() {
        let entities = vec![
            entity("P1", &["d1"], &[]),
            entity("P2", &[], &["1.1.1.1"]),
        ];
        let build = GraphBuilder::default().build(&entities);
        assert_eq!(build.graph.node_count(), 1);
        assert_eq!(build.stats.entities_skipped, 1);
        assert_eq!(build.stats.nodes_created, 1);
    }

    #[test]
    fn fewer_than_two_nodes_yields_edgeless_graph_not_error() {
        let build = GraphBuilder::default().build(&[entity("P1", &["d1"], &[])]);
        assert_eq!(build.graph.edge_count(), 0);
        assert_eq!(build.stats.comparisons, 0);

        let empty = GraphBuilder::default().build(&[]);
        assert!(empty.graph.is_empty());
    }

    #[test]
    fn edge_weight_is_the_jaccard_value() {
        // {d1,d2,d3,d4} vs {d1,d3,d5} scores 0.4.
        let entities = vec![
            entity("P1", &["d1", "d2", "d3", "d4"], &[]),
            entity("P2", &["d1", "d3", "d5"], &[]),
        ];
        let build = GraphBuilder::new(0.1).unwrap().build(&entities);
        assert_eq!(build.graph.edge_count(), 1);
        assert_relative_eq!(build.graph.edges()[0].weight, 0.4);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let entities = vec![
            entity("P1", &["d1", "d2", "d3", "d4"], &[]),
            entity("P2", &["d1", "d3", "d5"], &[]),
        ];
        // Pair scores exactly 0.4: no edge at threshold 0.4.
        let at = GraphBuilder::new(0.4).unwrap().build(&entities);
        assert_eq!(at.graph.edge_count(), 0);
        // Just under: edge exists.
        let under = GraphBuilder::new(0.3999999).unwrap().build(&entities);
        assert_eq!(under.graph.edge_count(), 1);
    }

    #[test]
    fn no_self_loops_and_no_duplicate_pairs() {
        let entities = vec![
            entity("P1", &["d1", "d2"], &[]),
            entity("P2", &["d1", "d2"], &[]),
            entity("P3", &["d1", "d2", "d3"], &[]),
        ];
        let build = GraphBuilder::new(0.1).unwrap().build(&entities);
        let mut seen = std::collections::BTreeSet::new();
        for edge in build.graph.edges() {
            assert_ne!(edge.a, edge.b);
            assert!(edge.a < edge.b);
            assert!(seen.insert((edge.a, edge.b)), "duplicate pair");
        }
    }

    #[test]
    fn rebuild_on_identical_input_is_isomorphic() {
        let entities = vec![
            entity("P1", &["d1", "d2", "d3"], &["1.1.1.1"]),
            entity("P2", &["d2", "d3", "d4"], &[]),
            entity("P3", &["d1", "d4"], &[]),
            entity("P4", &["d9"], &[]),
        ];
        let builder = GraphBuilder::new(0.1).unwrap();
        let first = builder.build(&entities);
        let second = builder.build(&entities);

        assert_eq!(first.stats, second.stats);
        assert_eq!(first.graph.node_count(), second.graph.node_count());
        assert_eq!(first.graph.edges().len(), second.graph.edges().len());
        for (e1, e2) in first.graph.edges().iter().zip(second.graph.edges()) {
            assert_eq!(e1, e2);
        }
    }

    #[test]
    fn stats_count_labeled_and_unlabeled_nodes() {
        let entities = vec![
            entity("P1", &["d1"], &["1.1.1.1"]),
            entity("P2", &["d1"], &[]),
            entity("P3", &["d2"], &[]),
        ];
        let build = GraphBuilder::default().build(&entities);
        assert_eq!(build.stats.labeled_nodes, 1);
        assert_eq!(build.stats.unlabeled_nodes, 2);
        assert_eq!(build.stats.comparisons, 3);
    }
}
