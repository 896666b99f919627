//! Room actor commands, errors, and stats.
//!
//! This module defines the message types for communicating with the `RoomActor`:
//! - `RoomCommand`: Commands sent to the actor
//! - `RoomError`: Errors that can occur while talking to the actor
//! - `RoomStats`: Point-in-time view of a room, for observability and eviction

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;

use roomcast_core::ClientId;

use super::client::{Client, Registration};

// ============================================================================
// Room Commands
// ============================================================================

/// Commands sent to a room actor.
///
/// Commands are processed strictly in arrival order. Those that carry a
/// oneshot reply only after their effect has been applied.
#[derive(Debug)]
pub enum RoomCommand {
    /// Register a client.
    ///
    /// A client already registered under the same id is replaced
    /// (last writer wins).
    Attach {
        /// The client to register
        client: Client,
        /// Signalled once the client is in the set
        respond_to: oneshot::Sender<()>,
    },

    /// Deregister a client.
    ///
    /// Ignored unless the registered client with this id carries the
    /// same registration, so a late Detach never removes a re-attached
    /// client.
    Detach {
        /// ID of the client to remove
        client_id: ClientId,
        /// Registration of the client to remove
        registration: Registration,
    },

    /// Deliver ciphertext to every registered client.
    Broadcast {
        /// Encrypted wire text
        ciphertext: String,
        /// Number of clients the message was handed to
        respond_to: oneshot::Sender<usize>,
    },

    /// Report the current room state.
    Snapshot {
        /// Channel to send the result
        respond_to: oneshot::Sender<RoomStats>,
    },
}

// ============================================================================
// Room Errors
// ============================================================================

/// Errors that can occur during room operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoomError {
    /// The actor is gone, or dropped the reply.
    #[error("room channel closed")]
    ChannelClosed,
}

// ============================================================================
// Room Stats
// ============================================================================

/// Snapshot of a room's membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStats {
    /// Number of registered clients
    pub clients: usize,

    /// When the client set last became empty (`None` while occupied)
    pub idle_since: Option<Instant>,
}

impl RoomStats {
    /// Checks if the room has had no clients for at least `max_idle`.
    pub fn idle_for_at_least(&self, max_idle: std::time::Duration) -> bool {
        match self.idle_since {
            Some(since) => self.clients == 0 && since.elapsed() >= max_idle,
            None => false,
        }
    }
}
