//! mongo-mcp
//!
//! MCP server for MongoDB over stdio. stdout carries the protocol, so all
//! logging goes to stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mongo_guard::Policy;
use mongo_mcp::{Config, Connection, DocumentStore, Gateway, McpServer, PoolConfig};
use serde_json::json;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "mongo-mcp")]
#[command(about = "MongoDB MCP server with query validation and a safe/dangerous mode gate")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP over stdin/stdout (default)
    Serve {
        /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
        #[arg(short, long, default_value = "info")]
        log_level: Level,
    },

    /// Print an MCP client configuration snippet for this server
    PrintConfig,

    /// Print the resolved validation policy
    CheckPolicy,
}

fn init_logging(level: Level) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve {
        log_level: Level::INFO,
    }) {
        Command::Serve { log_level } => {
            init_logging(log_level)?;
            serve(config).await
        }
        Command::PrintConfig => print_config(&config),
        Command::CheckPolicy => {
            let policy = Policy::resolve(&config.policy_config());
            println!("{}", serde_json::to_string_pretty(&policy.summary())?);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    let policy = Arc::new(Policy::resolve(&config.policy_config()));

    info!(
        uri = %config.redacted_uri(),
        cluster = config.is_cluster_mode(),
        "connecting to MongoDB"
    );
    if policy.dangerous_mode() {
        warn!("dangerous mode enabled: write tools and gated operators are available");
    } else {
        info!("safe mode: read-only tools");
    }

    let connection = Connection::with_config(
        &config.connection_uri(),
        PoolConfig::with_timeout(config.timeout()),
    )
    .await?;

    match connection.ping().await {
        Ok(()) => info!("connected to MongoDB"),
        // The driver reconnects lazily; tools report database errors per call
        Err(e) => warn!(error = %e, "MongoDB ping failed, serving anyway"),
    }

    let gateway = Gateway::new(Arc::new(connection), policy);
    McpServer::new(gateway).run_stdio().await
}

fn print_config(config: &Config) -> Result<()> {
    let command = std::env::current_exe()
        .ok()
        .and_then(|path| path.to_str().map(str::to_string))
        .unwrap_or_else(|| "mongo-mcp".to_string());

    let mut env = json!({
        "MONGODB_HOST": config.host,
        "MONGODB_PORT": config.port.to_string(),
        "MONGODB_DATABASE": config.database,
        "MONGODB_ALLOW_DANGEROUS": config.allow_dangerous.to_string(),
        "MONGODB_MAX_DOCUMENTS": config.max_documents.to_string(),
        "MONGODB_TIMEOUT": config.timeout_secs.to_string(),
    });
    if let Some(username) = &config.username {
        env["MONGODB_USERNAME"] = json!(username);
        env["MONGODB_PASSWORD"] = json!("<password>");
        env["MONGODB_AUTH_DB"] = json!(config.auth_db);
    }

    let snippet = json!({
        "mcpServers": {
            "mongodb": {
                "command": command,
                "args": ["serve"],
                "env": env,
            }
        }
    });

    println!("{}", serde_json::to_string_pretty(&snippet)?);
    eprintln!("Resolved connection: {}", config.redacted_uri());
    Ok(())
}
