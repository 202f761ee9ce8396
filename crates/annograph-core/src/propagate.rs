//! Weighted multi-label propagation.
//!
//! One-hop, one-shot: every unlabeled node is classified from its
//! labeled neighbors in a single pass, and predicted labels never
//! feed back as voting evidence within the same run. Per-node
//! classification is independent, so the pass runs on the rayon pool
//! with an order-preserving collect.

use crate::error::AnnographError;
use crate::graph::SimilarityGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Propagation parameters. All defaults mirror the standard pipeline
/// configuration; `validate` runs before any node is visited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Neighbor edges below this weight are excluded from voting.
    /// This re-filters the already-thresholded graph; it can never
    /// loosen it.
    pub min_edge_weight: f64,
    /// Minimum per-label confidence for a label to be assigned.
    pub confidence_threshold: f64,
    /// Cap on assigned labels per node.
    pub max_labels_per_node: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            min_edge_weight: 0.1,
            confidence_threshold: 0.3,
            max_labels_per_node: 5,
        }
    }
}

impl PropagationConfig {
    /// Fail fast on out-of-range parameters; never clamp silently.
    pub fn validate(&self) -> Result<(), AnnographError> {
        if !(0.0..=1.0).contains(&self.min_edge_weight) || self.min_edge_weight.is_nan() {
            return Err(AnnographError::invalid_config(format!(
                "min_edge_weight {} outside [0, 1]",
                self.min_edge_weight
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) || self.confidence_threshold.is_nan()
        {
            return Err(AnnographError::invalid_config(format!(
                "confidence_threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if self.max_labels_per_node < 1 {
            return Err(AnnographError::invalid_config(
                "max_labels_per_node must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Propagation output for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub entity_id: String,
    /// Labels ranked descending by confidence, ties broken by
    /// ascending label token.
    pub predicted_labels: Vec<String>,
    /// Confidence per emitted label, each in
    /// `[confidence_threshold, 1.0]`.
    pub confidence: BTreeMap<String, f64>,
    /// Arithmetic mean of the emitted confidences.
    pub average_confidence: f64,
}

/// Counters accumulated over one propagation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropagateStats {
    /// Unlabeled nodes with at least one qualifying neighbor.
    pub candidate_nodes: usize,
    /// Nodes that received a prediction record.
    pub nodes_annotated: usize,
    /// Total labels assigned across all records.
    pub labels_assigned: usize,
    /// Mean of per-record `average_confidence` (0.0 when no records).
    pub average_confidence: f64,
}

/// Result of one propagation run.
#[derive(Debug, Clone)]
pub struct Propagation {
    pub predictions: Vec<Prediction>,
    pub stats: PropagateStats,
}

struct NodeOutcome {
    node: u32,
    /// Node had at least one qualifying neighbor.
    considered: bool,
    prediction: Option<Prediction>,
}

/// Classify every unlabeled node from its labeled neighbors and write
/// the emitted predictions back onto the matching graph nodes.
///
/// Deterministic: rerunning on the same graph and config produces
/// identical records in identical order. Nodes without qualifying
/// neighbors, or whose candidates all fall below the confidence
/// threshold, are silently skipped.
pub fn propagate(
    graph: &mut SimilarityGraph,
    config: &PropagationConfig,
) -> Result<Propagation, AnnographError> {
    config.validate()?;

    if config.min_edge_weight < graph.threshold() {
        // Every edge already satisfies weight > build threshold, so a
        // looser propagation filter collapses to the build threshold.
        warn!(
            min_edge_weight = config.min_edge_weight,
            build_threshold = graph.threshold(),
            "min_edge_weight below graph build threshold has no effect"
        );
    }

    let view: &SimilarityGraph = graph;
    let outcomes: Vec<NodeOutcome> = (0..view.node_count() as u32)
        .into_par_iter()
        .filter_map(|node| classify(view, node, config))
        .collect();

    let mut stats = PropagateStats::default();
    let mut predictions = Vec::new();
    for outcome in outcomes {
        if outcome.considered {
            stats.candidate_nodes += 1;
        }
        if let Some(prediction) = outcome.prediction {
            stats.nodes_annotated += 1;
            stats.labels_assigned += prediction.predicted_labels.len();
            graph.set_predictions(
                outcome.node,
                prediction
                    .predicted_labels
                    .iter()
                    .map(|label| (label.clone(), prediction.confidence[label]))
                    .collect(),
            );
            predictions.push(prediction);
        }
    }
    if !predictions.is_empty() {
        stats.average_confidence = predictions
            .iter()
            .map(|p| p.average_confidence)
            .sum::<f64>()
            / predictions.len() as f64;
    }

    info!(
        candidates = stats.candidate_nodes,
        annotated = stats.nodes_annotated,
        labels = stats.labels_assigned,
        "propagation complete"
    );

    Ok(Propagation { predictions, stats })
}

/// Weighted-majority vote for one unlabeled node. Returns `None` for
/// labeled nodes; the vote table is local to this call and discarded
/// with it.
fn classify(
    graph: &SimilarityGraph,
    node: u32,
    config: &PropagationConfig,
) -> Option<NodeOutcome> {
    let this = graph.node(node)?;
    if this.is_labeled() {
        return None;
    }

    let mut votes: BTreeMap<&str, f64> = BTreeMap::new();
    let mut total_weight = 0.0;
    for (neighbor, weight) in graph.neighbors(node) {
        if weight < config.min_edge_weight {
            continue;
        }
        let neighbor = graph.node(neighbor).expect("adjacency points at nodes");
        if !neighbor.is_labeled() {
            continue;
        }
        total_weight += weight;
        for label in &neighbor.labels {
            *votes.entry(label.as_str()).or_insert(0.0) += weight;
        }
    }

    if total_weight == 0.0 {
        // No qualifying neighbor: absence of a record, not an empty one.
        return Some(NodeOutcome {
            node,
            considered: false,
            prediction: None,
        });
    }

    let mut ranked: Vec<(&str, f64)> = votes
        .into_iter()
        .map(|(label, vote)| (label, vote / total_weight))
        .filter(|&(_, confidence)| confidence >= config.confidence_threshold)
        .collect();
    // Descending confidence; BTreeMap order already gives the
    // ascending-label tie-break under a stable sort.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(config.max_labels_per_node);

    let prediction = if ranked.is_empty() {
        None
    } else {
        let confidence: BTreeMap<String, f64> = ranked
            .iter()
            .map(|&(label, c)| (label.to_string(), c))
            .collect();
        let average_confidence =
            ranked.iter().map(|&(_, c)| c).sum::<f64>() / ranked.len() as f64;
        Some(Prediction {
            entity_id: this.id.clone(),
            predicted_labels: ranked.iter().map(|&(label, _)| label.to_string()).collect(),
            confidence,
            average_confidence,
        })
    };

    Some(NodeOutcome {
        node,
        considered: true,
        prediction,
    })
}
