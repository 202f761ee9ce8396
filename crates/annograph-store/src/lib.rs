//! Annograph persistence boundary.
//!
//! The core computes over plain in-memory data; this crate owns
//! everything that touches a file or a store:
//!
//! - [`EntitySource`] / [`PredictionSink`]: the seams a backing store
//!   (document database, graph database, flat files) plugs into. The
//!   core only ever needs a full scan of entities and an idempotent
//!   per-record prediction write.
//! - JSON implementations of both seams, plus a versioned binary
//!   graph snapshot, in [`persistence`].
//! - [`AnnotatedEntity`]: the back-annotation projection that marks
//!   entity records as predicted, so downstream consumers can treat
//!   "labeled" and "predicted" as mutually exclusive queryable flags.
//!
//! Persistence failures never invalidate computed results: the caller
//! keeps the in-memory batch and may simply retry the write.

pub mod persistence;


use annograph_core::{Entity, Prediction};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Boundary traits
// ============================================================================

/// Supplies all entities for one build run.
pub trait EntitySource {
    /// Full scan. The core imposes no ordering requirements beyond
    /// the source being deterministic for reproducible builds.
    fn entities(&self) -> Result<Vec<Entity>>;
}

/// Receives one computed prediction batch.
///
/// Writes are keyed by entity id and idempotent: a rerun overwrites
/// the previous batch rather than appending to it.
pub trait PredictionSink {
    fn write_predictions(&self, predictions: &[Prediction]) -> Result<()>;
}

// ============================================================================
// Back-annotation projection
// ============================================================================

/// An entity record projected together with its prediction, the shape
/// handed back to the entity-side store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedEntity {
    pub id: String,
    pub features: BTreeSet<String>,
    pub labels: BTreeSet<String>,
    /// Ranked predicted labels; empty unless `is_predicted`.
    #[serde(default)]
    pub predicted_labels: Vec<String>,
    #[serde(default)]
    pub prediction_confidence: BTreeMap<String, f64>,
    pub is_predicted: bool,
    #[serde(default)]
    pub average_confidence: f64,
}

/// Project a prediction batch back onto its source entities.
///
/// Entities without a matching prediction pass through with
/// `is_predicted = false`; labeled entities never match by
/// construction, so the two flags stay mutually exclusive.
pub fn annotate_entities(entities: &[Entity], predictions: &[Prediction]) -> Vec<AnnotatedEntity> {
    let by_id: BTreeMap<&str, &Prediction> = predictions
        .iter()
        .map(|p| (p.entity_id.as_str(), p))
        .collect();

    entities
        .iter()
        .map(|entity| match by_id.get(entity.id.as_str()) {
            Some(p) => AnnotatedEntity {
                id: entity.id.clone(),
                features: entity.features.clone(),
                labels: entity.labels.clone(),
                predicted_labels: p.predicted_labels.clone(),
                prediction_confidence: p.confidence.clone(),
                is_predicted: true,
                average_confidence: p.average_confidence,
            },
            None => AnnotatedEntity {
                id: entity.id.clone(),
                features: entity.features.clone(),
                labels: entity.labels.clone(),
                predicted_labels: Vec::new(),
                prediction_confidence: BTreeMap::new(),
                is_predicted: false,
                average_confidence: 0.0,
            },
        })
        .collect()
}

// ============================================================================
// Token parsing
// ============================================================================

/// Split a delimited token field (e.g. `"IPR001128; IPR002403;"`)
/// into a clean token set. Empty segments and surrounding whitespace
/// are dropped; an empty or whitespace-only input yields the empty
/// set.
pub fn parse_token_field(raw: &str, delimiter: char) -> BTreeSet<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
