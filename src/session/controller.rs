//! The streaming chat session controller.

use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::transcript::{ConnectionStatus, Message, Transcript};
use crate::error::ChatError;
use crate::protocol::{Frame, FrameAssembler};
use crate::transport::{Connector, EventStream, Transport, TransportEvent};
use crate::view::SessionView;

/// One chat session over one connection.
///
/// Owns the transcript, the streaming buffer and the connection. All
/// mutation goes through `&mut self`, so the hosting event loop serializes
/// inbound events and user sends.
///
/// The connection is closed exactly once: by [`ChatSession::teardown`], or
/// on drop if the session goes away any other way. A reply that has not
/// been terminated by then is discarded.
#[derive(Debug)]
pub struct ChatSession<T: Transport> {
    id: Uuid,
    transcript: Transcript,
    assembler: FrameAssembler,
    status: ConnectionStatus,
    transport: Option<T>,
}

impl<T: Transport> Default for ChatSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ChatSession<T> {
    /// Create a session that has not connected yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: Transcript::new(),
            assembler: FrameAssembler::new(),
            status: ConnectionStatus::Connecting,
            transport: None,
        }
    }

    /// Open the connection and return its inbound events.
    ///
    /// On failure the session moves to the `error` state and no event stream
    /// is returned. There is no retry; create a new session to try again.
    pub async fn connect<C>(&mut self, connector: &C, url: &Url) -> Option<EventStream>
    where
        C: Connector<Transport = T>,
    {
        match connector.connect(url).await {
            Ok((transport, events)) => {
                self.transport = Some(transport);
                self.status = ConnectionStatus::Connected;
                info!(
                    name: "session.connected",
                    session_id = %self.id,
                    url = %url,
                    "Chat session connected"
                );
                Some(events)
            }
            Err(e) => {
                self.status = ConnectionStatus::Error;
                warn!(
                    name: "session.connect_failed",
                    session_id = %self.id,
                    url = %url,
                    error = %e,
                    "Chat session could not connect"
                );
                None
            }
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Partial assistant text received since the last terminator.
    #[must_use]
    pub fn streaming(&self) -> &str {
        self.assembler.buffer()
    }

    /// Owned copy of everything the rendering layer needs.
    #[must_use]
    pub fn snapshot(&self) -> SessionView {
        SessionView {
            status: self.status,
            messages: self.transcript.as_slice().to_vec(),
            streaming: self.assembler.buffer().to_owned(),
        }
    }

    /// Send user text.
    ///
    /// The text is trimmed; empty text or a session that is not connected
    /// makes this a no-op returning `Ok(None)`. Otherwise the user message
    /// is appended before transmission and stays even if sending fails.
    pub fn send(&mut self, text: &str) -> Result<Option<&Message>, ChatError> {
        let text = text.trim();
        if text.is_empty() || self.status != ConnectionStatus::Connected {
            return Ok(None);
        }
        let Some(transport) = self.transport.as_mut() else {
            return Ok(None);
        };

        let message = self.transcript.append(Message::user(text));

        match transport.send_text(text) {
            Ok(()) => {
                debug!(
                    session_id = %self.id,
                    length = text.len(),
                    "User message sent"
                );
                Ok(Some(message))
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "User message not transmitted");
                self.status = ConnectionStatus::Error;
                Err(e.into())
            }
        }
    }

    /// Feed one inbound frame. Returns the assistant message it completed, if any.
    pub fn on_fragment(&mut self, chunk: &str) -> Option<&Message> {
        match self.assembler.push(chunk) {
            Frame::Pending => {
                tracing::trace!(session_id = %self.id, delta_length = chunk.len(), "Fragment");
                None
            }
            Frame::Empty => None,
            Frame::Complete(text) => {
                debug!(
                    session_id = %self.id,
                    length = text.len(),
                    "Assistant message complete"
                );
                Some(self.transcript.append(Message::assistant(text)))
            }
        }
    }

    /// Route one transport event.
    pub fn handle_event(&mut self, event: TransportEvent) -> Option<&Message> {
        match event {
            TransportEvent::Fragment(chunk) => self.on_fragment(&chunk),
            TransportEvent::Closed => {
                info!(name: "session.disconnected", session_id = %self.id, "Remote closed the connection");
                self.status = ConnectionStatus::Disconnected;
                None
            }
            TransportEvent::Failed(reason) => {
                warn!(
                    name: "session.transport_failed",
                    session_id = %self.id,
                    reason = %reason,
                    "Connection failed"
                );
                self.status = ConnectionStatus::Error;
                None
            }
        }
    }

    /// Close the connection and wait for the close to flush.
    pub async fn teardown(mut self) {
        if let Some(mut transport) = self.release() {
            transport.flush_close().await;
        }
    }

    fn release(&mut self) -> Option<T> {
        let mut transport = self.transport.take()?;
        let discarded = self.assembler.discard();
        if !discarded.is_empty() {
            debug!(
                session_id = %self.id,
                length = discarded.len(),
                "Discarding unterminated assistant message"
            );
        }
        transport.close();
        info!(name: "session.closed", session_id = %self.id, "Chat session closed");
        Some(transport)
    }
}

impl<T: Transport> Drop for ChatSession<T> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
