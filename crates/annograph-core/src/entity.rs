//! External entity records consumed by the graph builder.
//!
//! An entity is whatever the upstream document store hands us: a
//! stable identifier, a set of discrete feature tokens (e.g. domain
//! identifiers) and a possibly-empty set of category labels (e.g.
//! enzyme classification codes). Tokens are opaque strings compared
//! by equality; no behavior is attached beyond identity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One input record for a build run. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier within one build run.
    pub id: String,
    /// Discrete feature tokens. Entities with an empty set carry no
    /// comparable signal and are excluded from the graph.
    #[serde(default)]
    pub features: BTreeSet<String>,
    /// Category labels. Empty means the entity is a propagation target.
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            features: BTreeSet::new(),
            labels: BTreeSet::new(),
        }
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the entity arrives with ground-truth labels.
    pub fn is_labeled(&self) -> bool {
        !self.labels.is_empty()
    }
}
