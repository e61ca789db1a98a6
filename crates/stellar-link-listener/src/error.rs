/// Errors that can occur in listener and sender operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Transport-level error. Bind failures land here.
    #[error("transport error: {0}")]
    Transport(#[from] stellar_link_transport::TransportError),

    /// Message-level error.
    #[error("message error: {0}")]
    Message(#[from] stellar_link_message::MessageError),

    /// The accept loop task panicked or was cancelled.
    #[error("listener task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

impl ListenerError {
    /// True when the listener could not claim its socket path.
    pub fn is_bind_error(&self) -> bool {
        matches!(
            self,
            Self::Transport(
                stellar_link_transport::TransportError::Bind { .. }
                    | stellar_link_transport::TransportError::PathTooLong { .. }
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, ListenerError>;
