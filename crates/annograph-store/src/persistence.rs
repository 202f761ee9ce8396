//! File-backed implementations of the boundary seams.
//!
//! - Entities: JSON array of records (`id`, `features`, `labels`).
//! - Predictions: one JSON document keyed by entity id, rewritten
//!   whole on every run so a rerun overwrites rather than appends.
//! - Graph: versioned bincode snapshot, so a propagation run can load
//!   a previously built graph without recomputing the pairwise phase.

use crate::{annotate_entities, EntitySource, PredictionSink};
use annograph_core::{Entity, Prediction, SimilarityGraph};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Snapshot format version; bump on any breaking change to the graph
/// serialization.
pub const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// Entities
// ============================================================================

/// Reads entities from a JSON array file.
#[derive(Debug, Clone)]
pub struct JsonEntitySource {
    path: PathBuf,
}

impl JsonEntitySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EntitySource for JsonEntitySource {
    fn entities(&self) -> Result<Vec<Entity>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading entities from {}", self.path.display()))?;
        let entities: Vec<Entity> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing entities from {}", self.path.display()))?;
        info!(count = entities.len(), path = %self.path.display(), "loaded entities");
        Ok(entities)
    }
}

// ============================================================================
// Predictions
// ============================================================================

/// Writes the prediction batch as one JSON document keyed by entity
/// id, and optionally projects it back onto the entity records.
#[derive(Debug, Clone)]
pub struct JsonPredictionStore {
    predictions_path: PathBuf,
}

impl JsonPredictionStore {
    pub fn new(predictions_path: impl Into<PathBuf>) -> Self {
        Self {
            predictions_path: predictions_path.into(),
        }
    }

    /// Write the back-annotated entity projection next to the
    /// predictions document.
    pub fn write_annotated(
        &self,
        path: &Path,
        entities: &[Entity],
        predictions: &[Prediction],
    ) -> Result<()> {
        let annotated = annotate_entities(entities, predictions);
        let json = serde_json::to_string_pretty(&annotated)?;
        fs::write(path, json)
            .with_context(|| format!("writing annotated entities to {}", path.display()))?;
        info!(count = annotated.len(), path = %path.display(), "wrote annotated entities");
        Ok(())
    }
}

impl PredictionSink for JsonPredictionStore {
    fn write_predictions(&self, predictions: &[Prediction]) -> Result<()> {
        // Keyed map, rewritten whole: identical batches produce
        // byte-identical files.
        let by_id: BTreeMap<&str, &Prediction> = predictions
            .iter()
            .map(|p| (p.entity_id.as_str(), p))
            .collect();
        let json = serde_json::to_string_pretty(&by_id)?;
        fs::write(&self.predictions_path, json).with_context(|| {
            format!(
                "writing predictions to {}",
                self.predictions_path.display()
            )
        })?;
        info!(
            count = predictions.len(),
            path = %self.predictions_path.display(),
            "wrote predictions"
        );
        Ok(())
    }
}

// ============================================================================
// Graph snapshots
// ============================================================================

#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    version: u32,
    graph: SimilarityGraph,
}

/// Persist a built graph as a versioned binary snapshot.
pub fn save_graph(path: &Path, graph: &SimilarityGraph) -> Result<()> {
    let snapshot = GraphSnapshot {
        version: SNAPSHOT_VERSION,
        graph: graph.clone(),
    };
    let bytes = bincode::serialize(&snapshot).context("serializing graph snapshot")?;
    fs::write(path, bytes)
        .with_context(|| format!("writing graph snapshot to {}", path.display()))?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        path = %path.display(),
        "saved graph snapshot"
    );
    Ok(())
}

/// Load a graph snapshot written by [`save_graph`].
pub fn load_graph(path: &Path) -> Result<SimilarityGraph> {
    let bytes = fs::read(path)
        .with_context(|| format!("reading graph snapshot from {}", path.display()))?;
    let snapshot: GraphSnapshot =
        bincode::deserialize(&bytes).context("deserializing graph snapshot")?;
    if snapshot.version != SNAPSHOT_VERSION {
        bail!(
            "unsupported graph snapshot version {} (expected {})",
            snapshot.version,
            SNAPSHOT_VERSION
        );
    }
    info!(
        nodes = snapshot.graph.node_count(),
        edges = snapshot.graph.edge_count(),
        path = %path.display(),
        "loaded graph snapshot"
    );
    Ok(snapshot.graph)
}
