use std::path::Path;

use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::transport::parse_endpoint;

/// Endpoint used when nothing else is configured.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws/chat";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: Option<bool>,

    /// WebSocket endpoint of the chat backend
    #[arg(long, env = "SQL_GENIE_WS_URL", global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Chat with the endpoint from the terminal (default)
    Chat,
    /// Run the loopback chat host
    Serve {
        /// Address to bind
        #[arg(long, env = "SQL_GENIE_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub server: ServerConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub ws_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub json: bool,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::load_from_cli(&cli)
    }

    /// Resolve configuration. Priority: CLI flag > CLI env var > `GENIE_*`
    /// env > config file > defaults.
    pub fn load_from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("client.ws_url", DEFAULT_WS_URL)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.allowed_origins", vec!["http://localhost:5173"])?
            .set_default("log.json", false)?;

        // Explicit file must exist; ./config.yaml is picked up only if present.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config.yaml").required(false));
        }

        // E.g. GENIE_CLIENT__WS_URL=ws://db-host:8000/ws/chat
        builder = builder.add_source(
            Environment::with_prefix("GENIE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .try_parsing(true),
        );

        if let Some(json) = cli.log_json {
            builder = builder.set_override("log.json", json)?;
        }
        if let Some(url) = &cli.url {
            builder = builder.set_override("client.ws_url", url.as_str())?;
        }
        if let Some(Command::Serve { host, port }) = &cli.command {
            if let Some(host) = host {
                builder = builder.set_override("server.host", host.as_str())?;
            }
            if let Some(port) = port {
                builder = builder.set_override("server.port", i64::from(*port))?;
            }
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        parse_endpoint(&self.client.ws_url)
            .map(|_| ())
            .map_err(|e| config::ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["sql-genie"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parses_serve() {
        let cli = Cli::try_parse_from(["sql-genie", "serve", "--port", "9001"]).unwrap();
        match cli.command {
            Some(Command::Serve { port, .. }) => assert_eq!(port, Some(9001)),
            other => panic!("expected serve, got {other:?}"),
        }
    }
}
