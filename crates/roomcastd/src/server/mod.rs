//! HTTP server for the hub.
//!
//! The server:
//! - Listens on a TCP socket and serves the axum router
//! - Runs the optional idle-room eviction task
//! - Supports graceful shutdown via CancellationToken, ending open
//!   streams so shutdown does not wait on long-lived subscribers
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Handler failures become HTTP error responses, never crashes

mod routes;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::HubConfig;
use crate::hub::Hub;
use crate::registry::spawn_eviction_task;

use routes::{router, AppState};

/// HTTP server exposing the hub.
pub struct HubServer {
    config: HubConfig,
    hub: Hub,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,
}

impl HubServer {
    /// Creates a new server with a fresh hub.
    pub fn new(config: HubConfig, cancel_token: CancellationToken) -> Self {
        let hub = Hub::new(&config);
        Self {
            config,
            hub,
            cancel_token,
        }
    }

    /// The hub served by this server.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Binds to the configured address and serves until cancelled.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|e| ServerError::Bind {
                address: self.config.bind_address.clone(),
                error: e.to_string(),
            })?;

        self.serve(listener).await
    }

    /// Serves on an already-bound listener until cancelled.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr: SocketAddr = listener
            .local_addr()
            .map_err(|e| ServerError::Io(e.to_string()))?;

        info!(address = %local_addr, "Hub server listening");

        let eviction = self.config.room_idle_timeout.map(|max_idle| {
            info!(max_idle_secs = max_idle.as_secs(), "Idle room eviction enabled");
            spawn_eviction_task(
                std::sync::Arc::clone(self.hub.registry()),
                max_idle,
                self.cancel_token.clone(),
            )
        });

        let app = router(AppState {
            hub: self.hub.clone(),
            keep_alive: self.config.keep_alive,
            shutdown: self.cancel_token.clone(),
        });

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel_token.clone().cancelled_owned())
            .await
            .map_err(|e| ServerError::Io(e.to_string()));

        self.cancel_token.cancel();
        if let Some(handle) = eviction {
            let _ = handle.await;
        }

        info!("Hub server stopped");
        result
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {address}: {error}")]
    Bind { address: String, error: String },

    #[error("I/O error: {0}")]
    Io(String),
}
