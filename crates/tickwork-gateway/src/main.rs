use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tickwork_core::config::TickworkConfig;
use tickwork_scheduler::{JobRegistry, SchedulerEngine, SharedState};
use tracing::{error, info, warn};

mod app;
mod http;

/// Recurring-job orchestrator with an HTTP query surface.
#[derive(Debug, Parser)]
#[command(name = "tickwork-gateway", version)]
struct Cli {
    /// Config file (default: $TICKWORK_CONFIG, then ~/.tickwork/tickwork.toml).
    #[arg(long)]
    config: Option<String>,
    /// Override `gateway.bind`.
    #[arg(long)]
    bind: Option<String>,
    /// Override `gateway.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tickwork_gateway=info,tickwork_scheduler=info,tickwork_jobs=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > TICKWORK_CONFIG env > ~/.tickwork/tickwork.toml
    // a missing file yields defaults; a malformed one is fatal
    let config_path = cli.config.or_else(|| std::env::var("TICKWORK_CONFIG").ok());
    let mut config = TickworkConfig::load(config_path.as_deref())?;
    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let state = Arc::new(SharedState::with_system_clock(
        config.scheduler.metrics_retention,
    ));

    // bad cadences and duplicate names are fatal here
    let mut registry = JobRegistry::new(config.scheduler.default_timeout());
    let jobs = tickwork_jobs::register_builtin_jobs(&mut registry, &config)?;
    info!(count = jobs.len(), jobs = ?jobs, "jobs registered");

    let engine = SchedulerEngine::new(registry, Arc::clone(&state))
        .with_shutdown_grace(config.scheduler.shutdown_grace());
    let board = engine.status_board();

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let export_path = config.scheduler.export_path.clone();

    let app_state = Arc::new(app::AppState::new(config, Arc::clone(&state), board));
    let router = app::build_router(app_state);

    // spawn scheduler engine loop in background
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine_task = tokio::spawn(engine.run(shutdown_rx));

    info!("Tickwork gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // signal scheduler to stop and wait for in-flight handlers
    let _ = shutdown_tx.send(true);
    let report = engine_task.await?;
    if report.is_clean() {
        info!(finished = ?report.finished, "all handlers finished");
    } else {
        warn!(
            unfinished = ?report.unfinished,
            "handlers still running after grace period"
        );
    }

    if let Some(path) = export_path {
        match state.export_metrics_to(&path) {
            Ok(()) => info!(%path, "metrics exported"),
            Err(e) => error!(%path, "metrics export failed: {e}"),
        }
    }
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
