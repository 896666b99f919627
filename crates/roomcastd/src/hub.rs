//! Boundary operations of the broadcast hub.
//!
//! `Hub` is what the HTTP layer talks to: `attach` turns a validated
//! request into a live [`Subscription`], `publish` seals a message under
//! the room secret and broadcasts it.

use std::sync::Arc;

use futures::stream::{self, Stream};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use roomcast_core::{CipherError, ClientId, Envelope, RoomCipher, RoomId, RoomSecret};
use roomcast_protocol::{AttachRequest, PublishRequest};

use crate::config::HubConfig;
use crate::registry::RoomRegistry;
use crate::room::{Client, Registration, RoomError, RoomHandle};

/// Errors surfaced by hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("room error: {0}")]
    Room(#[from] RoomError),

    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
}

/// Entry point for attaching and publishing.
///
/// Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct Hub {
    registry: Arc<RoomRegistry>,

    /// Delivery channel capacity per subscriber
    client_buffer: usize,
}

impl Hub {
    /// Creates a hub with a fresh registry.
    pub fn new(config: &HubConfig) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new(config.room_queue)),
            client_buffer: config.client_buffer,
        }
    }

    /// The shared room registry.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Attaches a subscriber to its room.
    ///
    /// The room is created if needed. Messages published after this
    /// returns are delivered to the subscription.
    pub async fn attach(&self, request: AttachRequest) -> Result<Subscription, HubError> {
        let AttachRequest { room_id, client_id } = request;

        let (client, receiver) = Client::channel(client_id.clone(), self.client_buffer);
        let registration = client.registration();
        let room = self.registry.attach(&room_id, client).await?;

        // Recomputed from the identifier rather than read off the room.
        let cipher = RoomCipher::new(&RoomSecret::derive(&room_id));

        info!(room_id = %room_id, client_id = %client_id, "Subscription opened");

        Ok(Subscription {
            room,
            client_id,
            registration,
            receiver,
            cipher,
            detached: false,
        })
    }

    /// Publishes `client_id:message` to every subscriber of the room.
    ///
    /// Returns the number of subscribers the message was handed to; an
    /// empty room is not an error.
    pub async fn publish(&self, request: PublishRequest) -> Result<usize, HubError> {
        let PublishRequest {
            room_id,
            client_id,
            message,
        } = request;

        let room = self.registry.resolve(&room_id).await;
        let cipher = RoomCipher::new(room.secret());

        let plaintext = Envelope::new(client_id.clone(), message).to_plaintext();
        let ciphertext = cipher.encrypt(&plaintext)?;

        let delivered = room.broadcast(ciphertext).await?;

        debug!(
            room_id = %room_id,
            client_id = %client_id,
            delivered,
            "Message published"
        );

        Ok(delivered)
    }
}

/// A live attachment to a room.
///
/// Yields decrypted messages. Dropping the subscription queues a Detach
/// for its client before the drop returns.
pub struct Subscription {
    room: RoomHandle,
    client_id: ClientId,
    registration: Registration,
    receiver: mpsc::Receiver<String>,
    cipher: RoomCipher,
    detached: bool,
}

impl Subscription {
    /// The room this subscription is attached to.
    pub fn room_id(&self) -> &RoomId {
        self.room.room_id()
    }

    /// The subscribing client.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Waits for the next message and decrypts it.
    ///
    /// Messages that fail to decrypt are logged and skipped. Returns
    /// `None` once the room stops delivering to this client.
    pub async fn next_message(&mut self) -> Option<String> {
        loop {
            let wire = self.receiver.recv().await?;

            match self.cipher.decrypt(&wire) {
                Ok(text) => return Some(text),
                Err(e) => {
                    warn!(
                        room_id = %self.room.room_id(),
                        client_id = %self.client_id,
                        error = %e,
                        "Dropping undecryptable message"
                    );
                }
            }
        }
    }

    /// Detaches from the room, waiting until the Detach is queued.
    pub async fn close(mut self) -> Result<(), RoomError> {
        self.detached = true;
        self.room.detach(self.client_id.clone(), self.registration).await
    }

    /// Converts the subscription into a stream of decrypted messages.
    pub fn into_stream(self) -> impl Stream<Item = String> + Send + 'static {
        stream::unfold(self, |mut sub| async move {
            let message = sub.next_message().await?;
            Some((message, sub))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }

        debug!(
            room_id = %self.room.room_id(),
            client_id = %self.client_id,
            "Subscription dropped, detaching"
        );
        self.room.detach_now(self.client_id.clone(), self.registration);
    }
}
