#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use core::time::Duration;
use fibreg::{Dispatcher, DrainOutcome};
use server::config::{CliArgs, ServerConfig};
use server::service::{AppState, router};
use server::telemetry::{TelemetryProviders, init_telemetry};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry(config.log_json)?;

    let dispatcher = Dispatcher::new(config.dispatcher.clone());
    let shutdown = CancellationToken::new();
    let state = AppState::new(dispatcher.clone(), config.max_input, shutdown.clone());
    let app = router(state, config.request_timeout);

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(
            dispatcher,
            shutdown,
            config.shutdown_timeout,
            providers,
        ))
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting sequence service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting sequence service on {} (max concurrent: {})",
            config.server_addr,
            config
                .dispatcher
                .max_concurrent
                .map_or_else(|| "unbounded".to_string(), |limit| limit.to_string())
        );
    }
}

/// Resolves once a stop is requested and the registry has drained.
///
/// axum stops accepting connections only after this returns, so lookups keep
/// being served while in-flight computations finish.
async fn shutdown_signal(
    dispatcher: Dispatcher,
    requested: CancellationToken,
    drain_timeout: Duration,
    providers: TelemetryProviders,
) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
        () = requested.cancelled() => tracing::info!("Received shutdown request"),
    }

    tracing::info!(
        "Shutdown signal received, draining {} in-flight computations...",
        dispatcher.inflight()
    );

    let report = dispatcher.shutdown(drain_timeout).await;
    match report.outcome {
        DrainOutcome::Drained => {
            tracing::info!("All computations finished in {:?}", report.waited);
        }
        DrainOutcome::TimedOut { abandoned } => {
            tracing::warn!(
                "Abandoned {abandoned} computations after waiting {:?}",
                report.waited
            );
        }
    }

    providers.shutdown();
}
