//! Client interface for interacting with a RoomActor.
//!
//! The `RoomHandle` is a cheap-to-clone interface for sending commands to
//! one room's actor. It also carries the room's identity and secret so
//! callers never need to touch the actor to encrypt.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `RoomError::ChannelClosed`

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use roomcast_core::{ClientId, RoomId, RoomSecret};

use super::client::{Client, Registration};
use super::commands::{RoomCommand, RoomError, RoomStats};

// ============================================================================
// Room Handle
// ============================================================================

/// Handle for interacting with a room actor.
///
/// # Usage
///
/// ```ignore
/// let room = spawn_room(room_id, DEFAULT_ROOM_QUEUE);
///
/// let (client, mut rx) = Client::channel(client_id.clone(), 64);
/// let registration = client.registration();
/// room.attach(client).await?;
///
/// room.broadcast(ciphertext).await?;
/// let delivered = rx.recv().await;
///
/// room.detach(client_id, registration).await?;
/// ```
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    secret: RoomSecret,

    /// Command sender to the actor
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Create a new room handle.
    pub fn new(room_id: RoomId, secret: RoomSecret, sender: mpsc::Sender<RoomCommand>) -> Self {
        Self {
            room_id,
            secret,
            sender,
        }
    }

    /// The room this handle talks to.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// The room's derived secret.
    pub fn secret(&self) -> &RoomSecret {
        &self.secret
    }

    /// Register a client and wait until it is part of the client set.
    ///
    /// Any broadcast issued after this returns reaches the client.
    ///
    /// # Errors
    ///
    /// - `RoomError::ChannelClosed` if the actor has shut down
    pub async fn attach(&self, client: Client) -> Result<(), RoomError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RoomCommand::Attach {
                client,
                respond_to: tx,
            })
            .await
            .map_err(|_| RoomError::ChannelClosed)?;

        rx.await.map_err(|_| RoomError::ChannelClosed)
    }

    /// Queue removal of a client.
    ///
    /// Returns once the command is queued; any broadcast queued after it
    /// will not reach the client. Only the client attached under
    /// `registration` is removed.
    ///
    /// # Errors
    ///
    /// - `RoomError::ChannelClosed` if the actor has shut down
    pub async fn detach(
        &self,
        client_id: ClientId,
        registration: Registration,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Detach {
                client_id,
                registration,
            })
            .await
            .map_err(|_| RoomError::ChannelClosed)
    }

    /// Queue removal of a client from a synchronous context.
    ///
    /// Used from `Drop`. When the queue is full the command is handed to a
    /// spawned task instead; the client's reader is gone by then, so late
    /// broadcasts fail fast against the closed channel. A re-attach that
    /// overtakes the spawned Detach keeps its registration.
    pub fn detach_now(&self, client_id: ClientId, registration: Registration) {
        let cmd = RoomCommand::Detach {
            client_id,
            registration,
        };
        match self.sender.try_send(cmd) {
            Ok(()) => {}
            Err(TrySendError::Full(cmd)) => match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let sender = self.sender.clone();
                    runtime.spawn(async move {
                        let _ = sender.send(cmd).await;
                    });
                }
                Err(_) => {
                    warn!(room_id = %self.room_id, "Room queue full and no runtime, detach lost");
                }
            },
            Err(TrySendError::Closed(_)) => {
                debug!(room_id = %self.room_id, "Room actor gone, detach skipped");
            }
        }
    }

    /// Broadcast ciphertext to every client registered when the command is
    /// processed.
    ///
    /// Returns the number of clients the message was handed to.
    ///
    /// # Errors
    ///
    /// - `RoomError::ChannelClosed` if the actor has shut down
    pub async fn broadcast(&self, ciphertext: String) -> Result<usize, RoomError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RoomCommand::Broadcast {
                ciphertext,
                respond_to: tx,
            })
            .await
            .map_err(|_| RoomError::ChannelClosed)?;

        rx.await.map_err(|_| RoomError::ChannelClosed)
    }

    /// Get a snapshot of the room's membership.
    ///
    /// # Errors
    ///
    /// - `RoomError::ChannelClosed` if the actor has shut down
    pub async fn stats(&self) -> Result<RoomStats, RoomError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RoomCommand::Snapshot { respond_to: tx })
            .await
            .map_err(|_| RoomError::ChannelClosed)?;

        rx.await.map_err(|_| RoomError::ChannelClosed)
    }

    /// Check if the actor is still running.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Check if both handles talk to the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("room_id", &self.room_id)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
