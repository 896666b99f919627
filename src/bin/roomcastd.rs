//! roomcast daemon - encrypted room broadcast over Server-Sent Events
//!
//! Clients attach to a room with a long-lived SSE stream and publish
//! messages that are encrypted under the room secret and fanned out to
//! every other subscriber.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default address (0.0.0.0:8080, or $ROOMCAST_BIND)
//! roomcastd
//!
//! # Listen elsewhere and retire rooms idle for ten minutes
//! roomcastd --bind 127.0.0.1:9000 --room-idle-timeout-secs 600
//!
//! # Subscribe and publish
//! curl -N 'http://localhost:8080/?room_id=alpha&client_id=bob'
//! curl -X POST -d 'room_id=alpha&client_id=carol&message=hi' http://localhost:8080/send
//! ```

use std::env;
use std::process;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use roomcastd::config::{
    BIND_ENV_VAR, DEFAULT_BIND_ADDRESS, DEFAULT_CLIENT_BUFFER, DEFAULT_KEEP_ALIVE,
};
use roomcastd::room::DEFAULT_ROOM_QUEUE;
use roomcastd::{HubConfig, HubServer};

/// roomcast daemon - encrypted room broadcast hub
#[derive(Parser, Debug)]
#[command(name = "roomcastd", version, about)]
struct Args {
    /// Address to listen on (falls back to $ROOMCAST_BIND, then 0.0.0.0:8080)
    #[arg(short, long)]
    bind: Option<String>,

    /// Messages buffered per subscriber before deliveries are dropped
    #[arg(long, default_value_t = DEFAULT_CLIENT_BUFFER)]
    client_buffer: usize,

    /// Command queue depth of each room
    #[arg(long, default_value_t = DEFAULT_ROOM_QUEUE)]
    room_queue: usize,

    /// Seconds between keep-alive comments on open streams
    #[arg(long, default_value_t = DEFAULT_KEEP_ALIVE.as_secs())]
    keep_alive_secs: u64,

    /// Evict rooms with no subscribers for this many seconds (off by default)
    #[arg(long)]
    room_idle_timeout_secs: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<HubConfig> {
        if self.client_buffer == 0 {
            bail!("--client-buffer must be at least 1");
        }
        if self.room_queue == 0 {
            bail!("--room-queue must be at least 1");
        }
        if self.keep_alive_secs == 0 {
            bail!("--keep-alive-secs must be at least 1");
        }

        let bind_address = match self.bind {
            Some(bind) => bind,
            None => env::var(BIND_ENV_VAR).unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
        };

        Ok(HubConfig {
            bind_address,
            client_buffer: self.client_buffer,
            room_queue: self.room_queue,
            keep_alive: Duration::from_secs(self.keep_alive_secs),
            room_idle_timeout: self.room_idle_timeout_secs.map(Duration::from_secs),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("roomcastd=info".parse()?)
                .add_directive("roomcast_core=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "roomcast daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let bind_address = config.bind_address.clone();
    let server = HubServer::new(config, cancel_token);

    info!(address = %bind_address, "Starting server");

    server
        .run()
        .await
        .with_context(|| format!("Server on {bind_address} failed"))?;

    info!("roomcast daemon stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
