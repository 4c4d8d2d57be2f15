//! SQL Genie terminal client.
//!
//! `sql-genie` (or `sql-genie chat`) connects to the configured endpoint and
//! chats from the terminal; `sql-genie serve` runs the loopback host.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::io::Write;

use clap::Parser;
use dotenvy::dotenv;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use sql_genie::config::{AppConfig, Cli, Command};
use sql_genie::server::{EchoResponder, ServerState, start_server};
use sql_genie::session::{ChatSession, ConnectionStatus, Sender};
use sql_genie::telemetry;
use sql_genie::transport::{TransportEvent, WebSocketConnector, parse_endpoint};
use sql_genie::view::{self, Composer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let config = AppConfig::load_from_cli(&cli)?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            telemetry::init("warn", config.log.json);
            run_chat(&config).await
        }
        Command::Serve { .. } => {
            telemetry::init("info,sql_genie=debug", config.log.json);
            start_server(&config.server, ServerState::new(EchoResponder)).await
        }
    }
}

/// Terminal event loop: inbound frames, stdin lines and Ctrl-C are handled
/// one at a time on this task.
async fn run_chat(config: &AppConfig) -> anyhow::Result<()> {
    let url = parse_endpoint(&config.client.ws_url)?;
    let mut session = ChatSession::new();

    print!("{}", view::render(&session.snapshot()));
    flush();

    let events = session.connect(&WebSocketConnector, &url).await;
    println!("{}", view::status_line(session.status()));

    let Some(mut events) = events else {
        // No retry; the user restarts to try again.
        anyhow::bail!("could not connect to {url}");
    };

    info!(name: "chat.started", session_id = %session.id(), url = %url, "Chat started");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut composer = Composer::new();

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                let was_streaming = !session.streaming().is_empty();
                let chunk = match &event {
                    TransportEvent::Fragment(chunk) => Some(chunk.clone()),
                    _ => None,
                };

                if session.handle_event(event).is_some() {
                    println!();
                } else if let Some(chunk) = chunk {
                    if !was_streaming && !session.streaming().is_empty() {
                        print!("{}", view::label(Sender::Assistant));
                    }
                    print!("{chunk}");
                }
                flush();

                if session.status() != ConnectionStatus::Connected {
                    if was_streaming {
                        println!();
                    }
                    println!("{}", view::status_line(session.status()));
                    break;
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                if let Some(text) = composer.on_line(&line) {
                    if let Err(e) = session.send(&text) {
                        tracing::warn!(error = %e, "Send failed");
                        println!("{}", view::status_line(session.status()));
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.teardown().await;
    Ok(())
}

fn flush() {
    let _ = std::io::stdout().flush();
}
