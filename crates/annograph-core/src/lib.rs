//! Annograph Core: Graph-Based Semi-Supervised Annotation
//!
//! Builds a weighted similarity network over entities described by
//! discrete attribute sets and propagates categorical labels across
//! it with edge-weighted confidence voting.
//!
//! Two components, consumed in sequence:
//!
//! 1. **Graph builder** ([`GraphBuilder`]): one node per entity with a
//!    non-empty feature set, one undirected edge per pair whose
//!    Jaccard similarity over feature tokens is strictly above the
//!    configured threshold; the Jaccard value is the edge weight.
//! 2. **Label propagator** ([`propagate`]): for every unlabeled node,
//!    exact weighted-majority voting over labeled neighbors, with a
//!    confidence floor, lexical tie-breaking, and a per-node label
//!    cap. One hop, one shot: predictions never feed back as voting
//!    evidence in the same run.
//!
//! Both phases are pure batch computations over in-memory data; all
//! persistence lives behind the source/sink traits in
//! `annograph-store`.
//!
//! Key representation choices:
//! - **String interning**: feature tokens become dense `u32` ids
//! - **Bitmap sets**: per-node features are Roaring bitmaps, so
//!   Jaccard is two bitmap ops and two cardinalities
//! - **Edge list + adjacency index**: each unordered pair stored
//!   once, neighbor lookup without scanning

pub mod builder;
pub mod entity;
pub mod error;
pub mod graph;
pub mod intern;
pub mod propagate;
pub mod similarity;

pub use builder::{BuildStats, GraphBuild, GraphBuilder, DEFAULT_SIMILARITY_THRESHOLD};
pub use entity::Entity;
pub use error::AnnographError;
pub use graph::{Edge, Node, SimilarityGraph};
pub use intern::FeatureInterner;
pub use propagate::{propagate, Prediction, Propagation, PropagateStats, PropagationConfig};
pub use similarity::{jaccard, jaccard_tokens};
