//! Sprig demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────▶ http::server (axum, limits, request ID)
//!                 │
//!                 ▼ spawn_blocking
//!             dispatch::Engine ──▶ routing::Router (prefix tree)
//!                 │
//!                 ▼
//!             Context chain: recovery → access_log → group mw → handler
//!                 │
//!     ◀────── Response
//!
//!     Cross-cutting: config (TOML), observability (tracing, metrics),
//!                    lifecycle (signals, shutdown, in-flight drain)
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use clap::Parser;
use serde_json::json;

use sprig::config::{load_config, ServerConfig};
use sprig::http::middleware::access_log;
use sprig::lifecycle::signals::trigger_on_signal;
use sprig::observability::{logging::init_tracing, metrics::init_metrics};
use sprig::{Context, Engine, HttpServer, RouteError, Shutdown};

#[derive(Parser)]
#[command(name = "sprig")]
#[command(about = "Demo server for the Sprig dispatch engine", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory served under /assets
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    init_tracing(&config.observability.log_level);
    tracing::info!("sprig v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let engine = build_engine(&config, &cli, shutdown.clone())?;
    for (method, pattern) in engine.routes() {
        tracing::debug!(method = %method, pattern = %pattern, "Route");
    }

    let listener = HttpServer::bind(&config.listener.bind_address).await?;
    tokio::spawn(trigger_on_signal(shutdown.clone()));

    let server = HttpServer::new(std::sync::Arc::new(engine), config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_engine(config: &ServerConfig, cli: &Cli, shutdown: Shutdown) -> Result<Engine, RouteError> {
    let mut engine = Engine::new();
    engine.set_shutdown(shutdown);
    if config.observability.access_log {
        engine.use_middleware(access_log());
    }

    engine.get("/", |ctx: &mut Context| {
        ctx.write_text(StatusCode::OK, "sprig\n");
    })?;

    engine.get("/hello/:name", |ctx: &mut Context| {
        let name = ctx.param("name").unwrap_or_default().to_string();
        ctx.write_text(StatusCode::OK, format!("hello {name}\n"));
    })?;

    engine.post("/login", |ctx: &mut Context| {
        let username = ctx.form_value("username").unwrap_or_default();
        ctx.write_json(StatusCode::OK, &json!({ "username": username }));
    })?;

    if let Some(assets) = &cli.assets {
        engine.static_files("/assets", assets.clone())?;
    }

    let mut api = engine.group("/api");
    api.use_middleware(|ctx: &mut Context| {
        ctx.set_header("x-api-version", "1");
        ctx.next();
    });
    api.get("/files/*filepath", |ctx: &mut Context| {
        let file = ctx.param("filepath").unwrap_or_default().to_string();
        ctx.write_json(StatusCode::OK, &json!({ "filepath": file }));
    })?;
    api.post("/jobs", |ctx: &mut Context| {
        // Runs past the response; shutdown waits for it.
        let guard = ctx.track_work();
        let signal = ctx.shutdown_signal();
        std::thread::spawn(move || {
            let _guard = guard;
            for _ in 0..20 {
                if signal.is_triggered() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        });
        ctx.write_json(StatusCode::ACCEPTED, &json!({ "status": "queued" }));
    })?;
    api.get("/panic", |_: &mut Context| {
        panic!("demo fault");
    })?;

    Ok(engine)
}
