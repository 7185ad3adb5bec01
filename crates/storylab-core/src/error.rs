use thiserror::Error;

/// The user-facing error taxonomy. Every failure in the crate maps onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or empty required input; blocks the request before it starts
    ValidationError,
    /// Transport failure, non-success status, or a malformed payload
    NetworkError,
    /// Durable draft storage failed; logged, never shown
    StorageError,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    // ── Validation ───────────────────────────────────────────────────────────
    #[error("{0}")]
    Validation(String),

    // ── Network ──────────────────────────────────────────────────────────────
    #[error("Request to generation endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Generation endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed generation response: {0}")]
    MalformedPayload(String),

    #[error("Generation task ended before producing a result: {0}")]
    Cancelled(String),
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Validation(_) => ErrorKind::ValidationError,
            GenerationError::Transport(_)
            | GenerationError::Status { .. }
            | GenerationError::MalformedPayload(_)
            | GenerationError::Cancelled(_) => ErrorKind::NetworkError,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Draft storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Draft database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Draft entries could not be encoded or decoded: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Draft storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::StorageError
    }
}
