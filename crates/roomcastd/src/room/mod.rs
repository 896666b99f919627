//! Per-room broadcast actor.
//!
//! Each room is owned by one `RoomActor` task. Attach, detach and
//! broadcast all travel through the same mpsc queue, so the actor sees
//! them in one total order and never delivers against a half-updated
//! client set.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   RoomHandle    │────▶│    RoomActor    │────▶│ Client channels │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//!         │                       │                       │
//!         │   RoomCommand         │   try_send            │
//!         │   (mpsc channel)      │   (bounded, per client)
//!         ▼                       ▼                       ▼
//!   Attach/Detach/           HashMap<ClientId,       Subscriptions
//!   Broadcast                Client>                 read ciphertext
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::mpsc;

use roomcast_core::{RoomId, RoomSecret};

mod actor;
mod client;
mod commands;
mod handle;

pub use actor::RoomActor;
pub use client::{Client, Registration};
pub use commands::{RoomCommand, RoomError, RoomStats};
pub use handle::RoomHandle;

/// Default depth of a room's command queue.
pub const DEFAULT_ROOM_QUEUE: usize = 256;

/// Spawn the actor for `room_id` and return a handle to it.
///
/// The secret is derived once here and carried by the handle. The actor
/// stops when every handle has been dropped.
pub fn spawn_room(room_id: RoomId, queue: usize) -> RoomHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(queue.max(1));
    let secret = RoomSecret::derive(&room_id);

    let actor = RoomActor::new(room_id.clone(), cmd_rx);
    tokio::spawn(actor.run());

    RoomHandle::new(room_id, secret, cmd_tx)
}
