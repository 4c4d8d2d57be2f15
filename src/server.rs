//! Loopback chat host.
//!
//! Serves the same `/ws/chat` protocol the client speaks: every inbound
//! text frame is one user message, answered by a stream of fragment frames
//! and a closing [`END_OF_MESSAGE`] frame. Replies come from a pluggable
//! [`Responder`]; [`EchoResponder`] is the built-in one.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderValue,
    response::IntoResponse,
    routing::get,
};
use futures::{Stream, StreamExt};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::ResponderError;
use crate::protocol::{END_OF_MESSAGE, warn_if_terminator};

/// Reply fragments, in wire order.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ResponderError>> + Send>>;

/// Produces the streamed reply to one user message.
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, message: String) -> ReplyStream;
}

/// Streams the user's words back, one fragment per word.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoResponder;

impl Responder for EchoResponder {
    fn respond(&self, message: String) -> ReplyStream {
        Box::pin(async_stream::stream! {
            yield Ok("Echo: ".to_string());
            for word in message.split_whitespace() {
                yield Ok(format!("{word} "));
            }
        })
    }
}

/// State shared by all connections.
#[derive(Clone)]
pub struct ServerState {
    pub responder: Arc<dyn Responder>,
}

impl fmt::Debug for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerState").finish_non_exhaustive()
    }
}

impl ServerState {
    #[must_use]
    pub fn new(responder: impl Responder) -> Self {
        Self {
            responder: Arc::new(responder),
        }
    }
}

/// Build the router: `/health` and `/ws/chat`.
pub fn router(state: ServerState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ws/chat", get(chat_socket))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start_server(config: &ServerConfig, state: ServerState) -> anyhow::Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        name: "server.started",
        address = %format!("ws://{address}/ws/chat"),
        origins = ?config.allowed_origins,
        "Server started"
    );

    axum::serve(listener, router(state, &config.allowed_origins)).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn chat_socket(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.responder))
}

async fn handle_socket(mut socket: WebSocket, responder: Arc<dyn Responder>) {
    let connection_id = Uuid::new_v4();
    info!(name: "chat.connected", connection_id = %connection_id, "Chat client connected");

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(connection_id = %connection_id, error = %e, "Socket read failed");
                break;
            }
        };

        debug!(connection_id = %connection_id, length = text.len(), "User message received");

        let mut frames = std::pin::pin!(framed(responder.respond(text)));
        while let Some(frame) = frames.next().await {
            if let Err(e) = socket.send(Message::Text(frame.into())).await {
                debug!(connection_id = %connection_id, error = %e, "Client went away mid-reply");
                return;
            }
        }
    }

    info!(name: "chat.disconnected", connection_id = %connection_id, "Chat client disconnected");
}

/// Frame a reply for the wire.
///
/// Yields every fragment in order, then exactly one terminator. A responder
/// failure becomes an `Error: <reason>` fragment and ends the reply early.
pub fn framed(mut reply: ReplyStream) -> impl Stream<Item = String> + Send {
    async_stream::stream! {
        while let Some(item) = reply.next().await {
            match item {
                Ok(fragment) => {
                    warn_if_terminator(&fragment);
                    yield fragment;
                }
                Err(e) => {
                    warn!(error = %e, "Responder failed");
                    yield format!("Error: {e}");
                    break;
                }
            }
        }
        yield END_OF_MESSAGE.to_string();
    }
}
