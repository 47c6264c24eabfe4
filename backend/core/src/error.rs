use thiserror::Error;

/// Top-level error type for the TenantLens analysis pipeline.
#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("text recovery failed during {stage}: {source:#}")]
    RecoveryFailure {
        stage: RecoveryStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not parse extraction output for chunk {chunk}: {message}")]
    ExtractionParseFailure { chunk: usize, message: String },

    #[error("LLM provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LeaseError {
    pub fn recovery(stage: RecoveryStage, source: impl Into<anyhow::Error>) -> Self {
        LeaseError::RecoveryFailure {
            stage,
            source: source.into(),
        }
    }
}

/// Where in text recovery a fatal failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    Decode,
    Rasterize,
    Recognize,
}

impl std::fmt::Display for RecoveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryStage::Decode => write!(f, "image decoding"),
            RecoveryStage::Rasterize => write!(f, "page rasterization"),
            RecoveryStage::Recognize => write!(f, "text recognition"),
        }
    }
}
