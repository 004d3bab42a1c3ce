/// Error type shared by every crate in the workspace.
///
/// Transport variants are connection-fatal: the main loop exits when it sees
/// one. Everything else is recoverable at the layer that produced it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AlsError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("message of {size} bytes exceeds the {limit} byte limit")]
    OversizedMessage { size: usize, limit: usize },

    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("task queue is full ({capacity} queued tasks)")]
    QueueFull { capacity: usize },

    #[error("thread pool is stopped")]
    Stopped,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl AlsError {
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        AlsError::InvalidHeader(msg.into())
    }

    pub fn invalid_json(msg: impl Into<String>) -> Self {
        AlsError::InvalidJson(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AlsError::Config(msg.into())
    }

    /// True when the error should tear down the connection rather than be
    /// reported to the peer.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AlsError::ConnectionClosed
                | AlsError::InvalidHeader(_)
                | AlsError::OversizedMessage { .. }
                | AlsError::Io(_)
        )
    }
}

impl From<std::io::Error> for AlsError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            AlsError::ConnectionClosed
        } else {
            AlsError::Io(err.to_string())
        }
    }
}
