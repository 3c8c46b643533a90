use crate::config;

/// Errors surfaced by the library API.
///
/// Construction either fully succeeds or fails with one of these; encoding
/// only fails if the tensor backend does.
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    /// Requested word-vector dimension is not published for the corpus.
    #[error("unsupported word vector dimension {0} (supported: {supported:?})", supported = config::glove::SUPPORTED_DIMS)]
    UnsupportedDimension(usize),

    /// The embedding table could not be read from the cache or downloaded.
    ///
    /// `reason` carries the full context chain of the underlying failure.
    #[error("embedding table for dim {dim} unavailable: {reason}")]
    EmbeddingUnavailable { dim: usize, reason: String },

    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

impl VocabError {
    pub(crate) fn unavailable(dim: usize, err: anyhow::Error) -> Self {
        Self::EmbeddingUnavailable {
            dim,
            reason: format!("{err:#}"),
        }
    }

    /// True for errors caused by the caller's configuration rather than the environment.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnsupportedDimension(_))
    }
}

pub type Result<T> = std::result::Result<T, VocabError>;
