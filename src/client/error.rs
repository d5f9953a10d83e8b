use thiserror::Error;

/// Everything the portfolio client can surface. Transient classes retry with
/// bounded backoff where the operation allows it; the rest surface
/// immediately. Nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("throttled by the backend")]
    Throttled,

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("upload failed with status {0}")]
    Upload(u16),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Retryable while resolving metadata: throttling and transport faults.
    pub fn is_transient_fetch(&self) -> bool {
        matches!(self, Self::Throttled | Self::Transport(_))
    }

    /// Retryable while deleting: 5xx responses as well, a read-after-write
    /// consistency workaround inherited from the storage backend. Client
    /// errors surface immediately.
    pub fn is_transient_delete(&self) -> bool {
        matches!(self, Self::Throttled | Self::Transport(_))
            || matches!(self, Self::Server { status, .. } if *status >= 500)
    }
}
