//! History Server - HTTP API for short-lived location history.
//!
//! Run with: `cargo run -p history-server`

use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use history_server::config::parse_ttl_secs;
use history_server::{AppState, Config, api};

/// History Server - HTTP API for short-lived location history.
#[derive(Parser, Debug)]
#[command(name = "history-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address: `port`, `:port` or `host:port` (overrides config and environment).
    #[arg(short, long)]
    bind: Option<String>,

    /// Location TTL, e.g. `60` or `5m` (overrides config and environment).
    #[arg(short, long, value_parser = parse_ttl_secs)]
    ttl: Option<u64>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("history_server=info".parse()?)
                .add_directive("history_store=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = load_config(&args)?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    run_server(config).await
}

/// Resolve configuration: file, then environment, then flags.
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    config.apply_env()?;

    config.apply_overrides(args.bind.as_deref(), args.ttl);

    config.validate()?;
    Ok(config)
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let bind = config.server.bind.clone();
    info!(
        "Location TTL is {}s; histories are kept in memory only",
        config.history.ttl_secs
    );

    let state = AppState::new(config);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind.as_str()).await?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
