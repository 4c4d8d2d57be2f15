//! Error types for the chat client and the loopback host.
//!
//! Every transport failure is surfaced to the user as a single connection
//! status (`error`); these types exist so callers and logs can still see
//! what happened.

/// Failure of the underlying connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint address is not a usable WebSocket URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The connection is already closed; nothing can be sent.
    #[error("Connection closed")]
    Closed,
}

/// Errors returned by [`crate::session::ChatSession`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The transport refused the outbound payload.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors produced while a responder streams a reply.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("{0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_converts_into_chat_error() {
        let err: ChatError = TransportError::Closed.into();
        assert_eq!(err.to_string(), "Transport error: Connection closed");
    }

    #[test]
    fn test_responder_error_message_is_bare() {
        let err = ResponderError::Failed("database unreachable".to_string());
        assert_eq!(err.to_string(), "database unreachable");
    }
}
