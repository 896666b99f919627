//! Runtime configuration for the hub and its HTTP server.

use std::time::Duration;

use crate::room::DEFAULT_ROOM_QUEUE;

/// Default listen address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Environment variable overriding the listen address
pub const BIND_ENV_VAR: &str = "ROOMCAST_BIND";

/// Default per-subscriber delivery buffer (messages)
pub const DEFAULT_CLIENT_BUFFER: usize = 64;

/// Default interval between SSE keep-alive comments
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Hub configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Messages buffered per subscriber before deliveries are dropped
    pub client_buffer: usize,

    /// Command queue depth of each room actor
    pub room_queue: usize,

    /// Interval between keep-alive comments on open streams
    pub keep_alive: Duration,

    /// Evict rooms that have had no clients for this long (`None` keeps
    /// rooms for the process lifetime)
    pub room_idle_timeout: Option<Duration>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            client_buffer: DEFAULT_CLIENT_BUFFER,
            room_queue: DEFAULT_ROOM_QUEUE,
            keep_alive: DEFAULT_KEEP_ALIVE,
            room_idle_timeout: None,
        }
    }
}
