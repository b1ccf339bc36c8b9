/// Errors fetching the upstream near-Earth object feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Upstream answered with a non-success status.
    #[error("NASA API returned {status}: {reason}")]
    Upstream { status: u16, reason: String },

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("failed to decode feed response: {0}")]
    Decode(String),
}

impl FeedError {
    /// Upstream status to pass through, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            FeedError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedServerError {
    #[error("Failed to bind to {address}:{port}: {error}")]
    BindError {
        address: String,
        port: u16,
        error: String,
    },
    #[error("Server thread panicked")]
    ThreadPanic,
}
