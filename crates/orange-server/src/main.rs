//! Orange Server - HTTP API for the Orange DBMS
//!
//! Loads the native engine, initializes it once, then serves:
//! - POST /api/exec - Execute a SQL statement
//! - GET /api/info - Engine information
//! - GET /health - Health check
//! - static front-end files for every other path

use anyhow::Context;
use clap::Parser;
use orange_bridge::{Bridge, EngineHandle};
use orange_server::{OrangeServer, build_router, config::Config};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Orange Server CLI arguments
#[derive(Parser, Debug)]
#[command(name = "orange-server")]
#[command(about = "Orange DBMS HTTP Server", long_about = None)]
struct Args {
    /// Enable verbose logging (prints debug information to stdout/stderr)
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Directory holding `orange.toml`
    #[arg(long = "config", default_value = "config")]
    config_dir: PathBuf,

    /// Bind address, overrides the config file and ORANGE_ADDR
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Full path of the engine library, overrides the configured directory and name
    #[arg(long)]
    library: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose, args.json_logs);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .thread_name("orange-worker")
        .enable_all()
        .build()?;

    rt.block_on(async_main(args))
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "orange_server=debug,orange_bridge=debug,tower_http=debug"
    } else {
        "orange_server=info,orange_bridge=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn async_main(args: Args) -> anyhow::Result<()> {
    // Load configuration (defaults < config/orange.toml < env < CLI)
    let mut config = Config::load(&args.config_dir)?;
    if let Some(addr) = args.addr {
        config = config.with_addr(addr);
    }
    if let Some(library) = args.library {
        config = config.with_library(library);
    }

    // Bring the engine up before accepting any request
    let engine = EngineHandle::load(&config.engine).with_context(|| {
        format!(
            "Failed to load engine library {}",
            config.engine.resolved_path().display()
        )
    })?;
    engine
        .setup()
        .context("Failed to initialize the native engine")?;
    let engine = Arc::new(engine);
    info!("Engine ready ({})", engine.description());

    let bridge = Arc::new(Bridge::new(engine.clone(), config.engine.serialize_calls));
    let server = Arc::new(OrangeServer::new(bridge, &config.dist_dir));
    let app = build_router(server);

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Orange Server listening on {}", config.addr);
    info!("Serving front-end from {}", config.dist_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // In-flight requests have drained; unload the engine
    engine.release();
    info!("Orange Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
