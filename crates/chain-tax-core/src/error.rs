use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainTaxError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Configuration error: the package contains no items")]
    NoPackageItems,

    #[error("Configuration error: unknown {kind} '{id}'")]
    UnresolvedEntity { kind: String, id: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ChainTaxError {
    /// Configuration errors are fatal to a run and surface before any pricing.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ChainTaxError::NoPackageItems | ChainTaxError::UnresolvedEntity { .. }
        )
    }

    pub(crate) fn unresolved(kind: &str, id: &str) -> Self {
        ChainTaxError::UnresolvedEntity {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChainTaxError {
    fn from(e: serde_json::Error) -> Self {
        ChainTaxError::SerializationError(e.to_string())
    }
}
