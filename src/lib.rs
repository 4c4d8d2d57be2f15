//! SQL Genie chat client
//!
//! A terminal client for a streaming chat endpoint. User questions go out as
//! single WebSocket text frames; the answer streams back as text fragments
//! closed by a sentinel terminator frame, and is rendered as a conversation.
//!
//! # Architecture
//!
//! - **Session**: one controller owning the transcript, the streaming buffer
//!   and the connection
//! - **Transport**: `tokio-tungstenite` WebSocket client behind a small trait
//! - **View**: read-only rendering plus the input composer
//! - **Server**: axum loopback host speaking the same protocol
//!
//! # Modules
//!
//! - [`protocol`]: Terminator framing and the two-state frame assembler
//! - [`session`]: Chat session controller and transcript types
//! - [`transport`]: Connection traits and the WebSocket implementation
//! - [`view`]: Rendering boundary
//! - [`server`]: Loopback `/ws/chat` host

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod view;
