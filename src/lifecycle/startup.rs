//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener (fail fast on error)
//! - Build the server and its controller
//! - Run it in the background under the shutdown coordinator
//! - Bound the drain once shutdown has been requested

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::admission::AdmissionController;
use crate::config::GateConfig;
use crate::http::GateServer;
use crate::lifecycle::Shutdown;

/// Failure to start or cleanly stop the gate.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("in-flight requests did not drain within {0:?}")]
    DrainTimeout(Duration),
}

/// A gate that is accepting traffic.
pub struct RunningGate {
    local_addr: SocketAddr,
    controller: Arc<AdmissionController>,
    shutdown: Shutdown,
    drain_timeout: Duration,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

/// Bind the configured address and start serving.
pub async fn start(config: GateConfig, shutdown: Shutdown) -> Result<RunningGate, LifecycleError> {
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| LifecycleError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        quota = config.admission.quota,
        session_window_ms = config.admission.session_window_ms,
        client_id_param = %config.admission.client_id_param,
        "Admission gate listening"
    );

    let drain_timeout = Duration::from_secs(config.timeouts.shutdown_drain_secs);
    let server = GateServer::new(config);
    let controller = server.controller();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, server_shutdown));

    Ok(RunningGate {
        local_addr,
        controller,
        shutdown,
        drain_timeout,
        handle,
    })
}

impl RunningGate {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn controller(&self) -> Arc<AdmissionController> {
        self.controller.clone()
    }

    /// Request shutdown and wait for the drain.
    pub async fn stop(self) -> Result<(), LifecycleError> {
        self.shutdown.trigger();
        self.drain().await
    }

    /// Serve until shutdown is requested elsewhere (or the server fails),
    /// then wait for the drain.
    pub async fn wait(mut self) -> Result<(), LifecycleError> {
        let mut rx = self.shutdown.subscribe();
        if !self.shutdown.is_triggered() {
            tokio::select! {
                res = &mut self.handle => return Ok(res??),
                _ = rx.recv() => {}
            }
        }
        self.drain().await
    }

    async fn drain(self) -> Result<(), LifecycleError> {
        let abort = self.handle.abort_handle();
        match tokio::time::timeout(self.drain_timeout, self.handle).await {
            Ok(res) => Ok(res??),
            Err(_) => {
                tracing::warn!(timeout = ?self.drain_timeout, "Drain deadline passed, aborting server");
                abort.abort();
                Err(LifecycleError::DrainTimeout(self.drain_timeout))
            }
        }
    }
}
