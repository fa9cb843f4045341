//! The listening HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use executor::PipelineExecutor;
use pipeline::ServiceConfig;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::{build_router, AppState};

/// Errors that stop the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The configured listen address.
        addr: SocketAddr,
        /// The OS error.
        #[source]
        source: std::io::Error,
    },

    /// The server failed while accepting connections.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Receives GitHub webhook deliveries on a bound TCP socket.
#[derive(Debug)]
pub struct WebhookListener {
    listener: TcpListener,
    state: AppState,
}

impl WebhookListener {
    /// Binds `config.listen_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bind`] if the address is unavailable.
    pub async fn bind(
        config: Arc<ServiceConfig>,
        executor: Arc<PipelineExecutor>,
    ) -> Result<Self, ListenerError> {
        let addr = config.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;
        Ok(Self {
            listener,
            state: AppState::new(config, executor),
        })
    }

    /// The address actually bound (differs from the configured one for port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Serves requests until `shutdown` resolves, then drains in-flight requests
    /// and waits for every accepted pipeline run to finish.
    ///
    /// A run outlives its HTTP connection, so the drain covers runs whose
    /// client has already hung up.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Serve`] if the accept loop fails.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ListenerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runs = self.state.runs.clone();
        let router = build_router(self.state);
        let served = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ListenerError::Serve);

        runs.close();
        if !runs.is_empty() {
            tracing::info!(pending = runs.len(), "waiting for in-flight pipeline runs");
        }
        runs.wait().await;
        served
    }
}
