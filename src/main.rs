//! Process entry point: parse CLI flags, resolve config, start the HTTP
//! server, and drain the worker pool on graceful shutdown.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zigdocs_server::cli::Args;
use zigdocs_server::config::Config;
use zigdocs_server::http::router::build_router;
use zigdocs_server::{build_app_state, worker::WorkerPool};

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = args.apply(Config::load(args.config.as_deref())?);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cfg.log_level.clone()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cfg.http_workers)
        .enable_all()
        .build()?;

    runtime.block_on(run(cfg))
}

async fn run(cfg: Config) -> Result<()> {
    let state = build_app_state(&cfg);
    let pool: WorkerPool = state.service.pool().clone();

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(cfg.bind_address()).await?;
    info!(address = %cfg.bind_address(), "zigdocs-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, draining in-flight jobs");
}
