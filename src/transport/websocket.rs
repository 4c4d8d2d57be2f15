//! WebSocket transport on `tokio-tungstenite`.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};
use url::Url;

use super::{Connector, EventStream, Transport, TransportEvent};
use crate::error::TransportError;

/// Upper bound on how long teardown waits for the close frame to flush.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Connects to a chat endpoint over WebSocket.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    async fn connect(&self, url: &Url) -> Result<(WebSocketTransport, EventStream), TransportError> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (mut ws_write, mut ws_read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<TransportEvent>();

        // Writer: drains queued frames; a dropped sender also means close.
        let writer = tokio::spawn(async move {
            while let Some(outbound) = outbound_rx.recv().await {
                match outbound {
                    Outbound::Text(text) => {
                        if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                            warn!(error = %e, "WebSocket send failed");
                            return;
                        }
                    }
                    Outbound::Close => break,
                }
            }

            if let Err(e) = ws_write.send(WsMessage::Close(None)).await {
                debug!(error = %e, "Close frame not delivered");
            }
            let _ = ws_write.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_read.next().await {
                let event = match frame {
                    Ok(WsMessage::Text(text)) => TransportEvent::Fragment(text.as_str().to_owned()),
                    Ok(WsMessage::Binary(bytes)) => {
                        TransportEvent::Fragment(String::from_utf8_lossy(&bytes).into_owned())
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = event_tx.send(TransportEvent::Failed(e.to_string()));
                        return;
                    }
                };
                if event_tx.send(event).is_err() {
                    return;
                }
            }
            let _ = event_tx.send(TransportEvent::Closed);
        });

        let transport = WebSocketTransport {
            outbound: Some(outbound_tx),
            writer: Some(writer),
            reader,
        };
        let events: EventStream =
            Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(event_rx));

        Ok((transport, events))
    }
}

/// Outbound half of a WebSocket connection.
///
/// Dropping it closes the connection.
#[derive(Debug)]
pub struct WebSocketTransport {
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    writer: Option<JoinHandle<()>>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        outbound
            .send(Outbound::Text(text.to_owned()))
            .map_err(|_closed| TransportError::Closed)
    }

    fn close(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outbound::Close);
        }
        self.reader.abort();
    }

    async fn flush_close(&mut self) {
        if let Some(writer) = self.writer.take() {
            if tokio::time::timeout(CLOSE_GRACE, writer).await.is_err() {
                debug!("Timed out waiting for close frame to flush");
            }
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}
