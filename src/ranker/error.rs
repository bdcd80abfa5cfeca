use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(#[from] EmbeddingError),

    #[error("Degenerate embedding for {subject}: zero magnitude")]
    DegenerateVector { subject: String },

    #[error("Embedding for {subject} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        subject: String,
        expected: usize,
        actual: usize,
    },
}

impl RankError {
    /// Stable machine-readable name for the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::EmbeddingProvider(_) => "embedding_provider",
            Self::DegenerateVector { .. } => "degenerate_vector",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
        }
    }

    /// Provider status code, when the failure came back from the provider.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            Self::EmbeddingProvider(e) => e.status_code(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;
