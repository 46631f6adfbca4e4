use thiserror::Error;

/// Errors raised while pulling text and images out of a single document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document type: {0}")]
    UnsupportedFormat(String),

    #[error("external tool not found: {0}")]
    ToolNotFound(String),

    #[error("{tool} failed: {reason}")]
    ExternalTool { tool: String, reason: String },

    #[error("{tool} exceeded timeout ({seconds}s)")]
    Timeout { tool: String, seconds: u64 },

    #[error("corrupt archive {path}: {reason}")]
    ArchiveCorruption { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub(crate) fn archive(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::ArchiveCorruption {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Misuse of the job store.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job not found: {0}")]
    NotFound(String),

    #[error("job {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },
}
