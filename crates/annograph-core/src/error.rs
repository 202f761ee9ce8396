use thiserror::Error;

/// Errors produced by the annotation core.
///
/// Both variants are fail-fast parameter checks. Degenerate inputs
/// (no entities, no qualifying neighbors) are normal outcomes, never
/// errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnnographError {
    /// Graph-build similarity threshold outside `[0, 1)`.
    #[error("invalid similarity threshold {value}: must be in [0, 1)")]
    InvalidThreshold { value: f64 },

    /// Propagation configuration rejected before any node is visited.
    #[error("invalid propagation config: {message}")]
    InvalidConfig { message: String },
}

impl AnnographError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
