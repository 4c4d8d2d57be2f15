//! Streaming chat session.
//!
//! A session owns one connection, an append-only [`Transcript`] and a
//! streaming buffer for the assistant reply currently being received.
//!
//! # Architecture
//!
//! - [`ChatSession`]: controller; the only writer of session state
//! - [`Transcript`]: ordered list of completed [`Message`]s
//! - [`ConnectionStatus`]: lifecycle value shown to the user
//!
//! # Example
//!
//! ```rust
//! use sql_genie::protocol::END_OF_MESSAGE;
//! use sql_genie::session::{ChatSession, ConnectionStatus};
//! use sql_genie::transport::WebSocketTransport;
//!
//! let mut session = ChatSession::<WebSocketTransport>::new();
//! assert_eq!(session.status(), ConnectionStatus::Connecting);
//!
//! session.on_fragment("SELECT 1;");
//! session.on_fragment(END_OF_MESSAGE);
//! assert_eq!(session.transcript().len(), 1);
//! ```

mod controller;
mod transcript;

pub use controller::ChatSession;
pub use transcript::{ConnectionStatus, Message, Sender, Transcript};
