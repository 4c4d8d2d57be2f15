//! Connection abstraction for the chat session.
//!
//! A [`Connector`] opens a connection and hands back two halves: a
//! [`Transport`] the session uses to send, and an [`EventStream`] of inbound
//! [`TransportEvent`]s the hosting event loop feeds back into the session.
//!
//! - [`WebSocketConnector`] / [`WebSocketTransport`]: `tokio-tungstenite` client

mod websocket;

pub use websocket::{WebSocketConnector, WebSocketTransport};

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use url::Url;

use crate::error::TransportError;

/// Inbound events, delivered in arrival order.
pub type EventStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send>>;

/// Lifecycle and data events coming from the remote end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame.
    Fragment(String),
    /// The remote end closed the connection.
    Closed,
    /// The connection failed; the reason is for logs only.
    Failed(String),
}

/// Outbound half of an open connection.
///
/// Sending and closing never block: implementations queue the work and
/// return immediately.
#[async_trait]
pub trait Transport: Send {
    /// Queue one text frame.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Start closing the connection. Calling it again has no effect.
    fn close(&mut self);

    /// Wait for a requested close to reach the wire.
    async fn flush_close(&mut self) {}
}

/// Opens connections to a chat endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    async fn connect(&self, url: &Url)
    -> Result<(Self::Transport, EventStream), TransportError>;
}

/// Parse and validate a chat endpoint address.
pub fn parse_endpoint(raw: &str) -> Result<Url, TransportError> {
    let url = Url::parse(raw.trim()).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(TransportError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{other}', expected ws or wss"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_accepts_ws_and_wss() {
        let url = parse_endpoint("ws://localhost:8000/ws/chat").unwrap();
        assert_eq!(url.path(), "/ws/chat");
        assert_eq!(url.port(), Some(8000));

        assert!(parse_endpoint(" wss://genie.example.com/ws/chat ").is_ok());
    }

    #[test]
    fn test_parse_endpoint_rejects_other_schemes() {
        let err = parse_endpoint("http://localhost:8000/ws/chat").unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
        assert!(err.to_string().contains("unsupported scheme 'http'"));

        assert!(parse_endpoint("not a url").is_err());
    }
}
