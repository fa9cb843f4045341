//! releasebot entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags and environment variables via `clap`,
//!    validated into an immutable [`pipeline::ServiceConfig`]. The process
//!    refuses to start on a missing or placeholder secret.
//! 2. **Wire observability**: configure `tracing-subscriber` (text or JSON)
//!    and, when an endpoint is set, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: a [`git::ProcessCommandRunner`] injected
//!    into the single [`executor::PipelineExecutor`].
//! 4. **Serve**: bind the [`listener::WebhookListener`] and run until Ctrl+C
//!    or SIGTERM, letting in-flight deliveries finish.

mod args;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use executor::PipelineExecutor;
use git::ProcessCommandRunner;
use listener::WebhookListener;
use pipeline::{CommandRunner, ServiceConfig};

use args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let telemetry = telemetry::init(args.log_format, args.debug, args.otlp_endpoint.as_deref())?;

    let config = match ServiceConfig::from_input(args.into_config_input()) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration; refusing to start");
            telemetry.shutdown();
            return Err(err).context("invalid configuration");
        }
    };

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessCommandRunner::new());
    let executor = Arc::new(PipelineExecutor::new(config.clone(), runner));
    let listener = WebhookListener::bind(config.clone(), executor).await?;

    let addr = listener.local_addr().unwrap_or(config.listen_addr);
    tracing::info!(%addr, "releasebot listening");
    tracing::info!(
        repository = %config.target_repository,
        workdir = %config.executor.workdir.display(),
        "listening for release events"
    );
    if config.debug {
        tracing::info!("debug mode enabled");
    }

    let result = listener.run(shutdown_signal()).await;
    tracing::info!("server stopped");
    telemetry.shutdown();
    result.map_err(Into::into)
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received; finishing in-flight deliveries");
}
