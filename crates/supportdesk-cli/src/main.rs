mod config;

use clap::{Parser, Subcommand, ValueEnum};
use config::SupportDeskConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use supportdesk_agent::ChatService;
use supportdesk_gateway::GatewayServer;
use supportdesk_session::{SessionStore, SqliteSessionStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "supportdesk", about = "Support desk chat assistant")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "supportdesk.toml")]
    config: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one message and print the reply
    Chat {
        message: String,
        /// Session to continue; a new one is started when omitted
        #[arg(short, long)]
        session: Option<String>,
    },
    /// List sessions, most recently active first
    Sessions,
    /// Print the full message log of a session
    History { session_id: String },
    /// List the loaded documentation topics
    Docs,
}

/// Filter from `var`, defaulting to `info`. Read after `.env` is loaded.
fn log_filter(var: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::DEFAULT_ENV))
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Client-style session id: `session_<unix millis>_<9 random chars>`.
fn new_session_id() -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(9)
        .collect();
    format!("session_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}

fn open_store(config: &SupportDeskConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    Ok(Arc::new(SqliteSessionStore::open(&config.database_path())?))
}

fn build_service(config: &SupportDeskConfig, config_dir: &Path) -> anyhow::Result<ChatService> {
    let store = open_store(config)?;
    let docs = Arc::new(config.load_docs(config_dir)?);
    Ok(ChatService::new(&config.model, store, docs))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before logging init so RUST_LOG from .env applies. A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.log_format);

    let mut config = SupportDeskConfig::load(&cli.config)?;
    config.apply_env_overrides(|key| std::env::var(key).ok())?;

    // Resolve config base directory (for a relative docs path)
    let config_dir = cli
        .config
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            info!(
                provider = %config.model.provider,
                database = %config.database_path().display(),
                "Starting support desk"
            );
            let service = Arc::new(build_service(&config, &config_dir)?);
            let app = GatewayServer::build(service);

            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Support desk listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Chat { message, session } => {
            let service = build_service(&config, &config_dir)?;
            let session_id = session.unwrap_or_else(new_session_id);
            let reply = service.handle_chat_message(&session_id, &message).await?;
            println!("{}", reply.reply);
            println!();
            println!("session: {}  tokens used: {}", session_id, reply.tokens_used);
        }
        Commands::Sessions => {
            let sessions = open_store(&config)?.list_sessions().await?;
            if sessions.is_empty() {
                println!("No sessions yet.");
            } else {
                for s in &sessions {
                    println!(
                        "{}  last active {}",
                        s.id,
                        s.updated_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
                println!("\nTotal: {} session(s)", sessions.len());
            }
        }
        Commands::History { session_id } => {
            let messages = open_store(&config)?.list_all_messages(&session_id).await?;
            if messages.is_empty() {
                println!("No messages for session '{}'.", session_id);
            }
            for m in &messages {
                println!(
                    "[{}] {}: {}",
                    m.created_at.format("%Y-%m-%d %H:%M:%S"),
                    m.role.label(),
                    m.content
                );
            }
        }
        Commands::Docs => {
            let docs = config.load_docs(&config_dir)?;
            if docs.is_empty() {
                println!("No documentation loaded.");
            } else {
                println!("Documentation topics:");
                for doc in docs.entries() {
                    println!("  {}", doc.title);
                }
                println!("\nTotal: {} topic(s)", docs.len());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn session_id_shape() {
        let id = new_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn log_filter_reads_dotenv_values() {
        let tmp = tempfile::tempdir().unwrap();
        let env_file = tmp.path().join(".env");
        std::fs::write(&env_file, "SUPPORTDESK_TEST_LOG=debug\n").unwrap();
        dotenvy::from_path(&env_file).unwrap();

        assert_eq!(log_filter("SUPPORTDESK_TEST_LOG").to_string(), "debug");
        assert_eq!(log_filter("SUPPORTDESK_UNSET_LOG").to_string(), "info");
    }

    #[test]
    fn session_ids_differ() {
        assert_ne!(new_session_id(), new_session_id());
    }

    #[test]
    fn cli_parses_chat_with_session() {
        let cli = Cli::try_parse_from([
            "supportdesk",
            "--log-format",
            "pretty",
            "chat",
            "refund?",
            "--session",
            "s1",
        ])
        .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Pretty));
        match cli.command {
            Commands::Chat { message, session } => {
                assert_eq!(message, "refund?");
                assert_eq!(session.as_deref(), Some("s1"));
            }
            _ => panic!("expected chat subcommand"),
        }
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["supportdesk", "serve"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("supportdesk.toml"));
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: None
            }
        ));
    }

    #[tokio::test]
    async fn build_service_over_temp_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SupportDeskConfig {
            data_dir: tmp.path().join("data"),
            ..SupportDeskConfig::default()
        };
        let service = build_service(&config, tmp.path()).unwrap();
        assert_eq!(service.provider_name(), Some("mock"));
        let reply = service.handle_chat_message("s1", "thanks").await.unwrap();
        assert_eq!(
            reply.reply,
            "You're welcome! Is there anything else I can help you with?"
        );
        assert!(config.database_path().exists());
    }
}
