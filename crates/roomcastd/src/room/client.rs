//! Subscriber handle held by a room.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use roomcast_core::ClientId;

static NEXT_REGISTRATION: AtomicU64 = AtomicU64::new(1);

/// Identity of one `Client::channel` call.
///
/// Two clients with the same `ClientId` never share a registration, so a
/// Detach aimed at an older client cannot remove its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Registration(u64);

impl Registration {
    fn next() -> Self {
        Self(NEXT_REGISTRATION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One attached stream consumer, as seen by the room.
///
/// The room only holds the sending half. The connection that created
/// the client owns the receiver, and with it the client's lifetime:
/// once the receiver is dropped, deliveries to this client fail fast.
#[derive(Debug, Clone)]
pub struct Client {
    /// Identifier, unique within the room
    pub id: ClientId,

    /// Distinguishes this client from earlier ones with the same id
    registration: Registration,

    /// Delivery channel of ciphertext messages
    sender: mpsc::Sender<String>,
}

impl Client {
    /// Creates a client and the reader end of its delivery channel.
    pub fn channel(id: ClientId, capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let client = Self {
            id,
            registration: Registration::next(),
            sender,
        };
        (client, receiver)
    }

    /// The registration a Detach must name to remove this client.
    pub fn registration(&self) -> Registration {
        self.registration
    }

    /// Attempts delivery without waiting.
    pub(crate) fn try_deliver(
        &self,
        message: String,
    ) -> Result<(), mpsc::error::TrySendError<String>> {
        self.sender.try_send(message)
    }

    /// Checks if the reader end is still alive.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}
