//! `zplay-server`: the interactive-fiction HTTP API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zplay_server::{AppState, ServerConfig, serve, spawn_sweeper};
use zplay_session::{Backend, InterpreterCommand, SessionRegistry};

#[derive(Parser)]
#[command(name = "zplay-server")]
#[command(about = "Play interactive fiction over a REST API.", version)]
struct Args {
    /// Port to listen on [env: PORT, default: 3000]
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long)]
    address: Option<String>,

    /// Interpreter backend: in-process, subprocess or stub [env: ZPLAY_BACKEND]
    #[arg(short, long)]
    backend: Option<Backend>,

    /// Directory of story files [env: ZPLAY_GAMES_DIR]
    #[arg(long)]
    games_dir: Option<PathBuf>,

    /// Story loaded when a request names none [env: ZPLAY_DEFAULT_GAME]
    #[arg(long)]
    default_game: Option<PathBuf>,

    /// Command line for the subprocess backend [env: ZPLAY_INTERPRETER]
    #[arg(long)]
    interpreter: Option<String>,

    /// Maximum number of live sessions [env: ZPLAY_MAX_SESSIONS]
    #[arg(long)]
    max_sessions: Option<usize>,

    /// Seconds of inactivity before a session is evicted [env: ZPLAY_IDLE_TIMEOUT_SECS]
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn apply(self, mut config: ServerConfig) -> Result<ServerConfig, String> {
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(address) = self.address {
            config = config.with_host(address);
        }
        let mut session = config.session.clone();
        if let Some(backend) = self.backend {
            session = session.with_backend(backend);
        }
        if let Some(dir) = self.games_dir {
            session = session.with_games_dir(dir);
        }
        if let Some(game) = self.default_game {
            session = session.with_default_game(game);
        }
        if let Some(line) = self.interpreter {
            let command = InterpreterCommand::parse(&line)
                .ok_or_else(|| "--interpreter must not be empty".to_string())?;
            session = session.with_interpreter(command);
        }
        if let Some(max) = self.max_sessions {
            session = session.with_max_sessions(max);
        }
        if let Some(secs) = self.idle_timeout_secs {
            session = session.with_idle_timeout(Duration::from_secs(secs));
        }
        Ok(config.with_session(session))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "zplay_server={log_level},zplay_session={log_level},zplay_zmachine={log_level}"
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.apply(ServerConfig::from_env()?)?;
    let registry = Arc::new(SessionRegistry::new(config.session.clone()));
    info!(
        backend = %config.session.backend,
        games_dir = %config.session.games_dir().display(),
        default_game = %config.session.default_game.display(),
        max_sessions = config.session.max_sessions,
        "session registry ready"
    );

    let sweeper = spawn_sweeper(Arc::clone(&registry), config.session.sweep_interval);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        warn!("Received Ctrl+C, shutting down gracefully...");
    };
    serve(listener, AppState::new(Arc::clone(&registry)), shutdown).await?;

    sweeper.abort();
    registry.shutdown().await;
    info!("zplay-server shut down gracefully");
    Ok(())
}
