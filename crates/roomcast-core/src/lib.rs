//! roomcast core - shared domain types for the broadcast hub
//!
//! This crate provides the pieces shared by the request layer
//! (`roomcast-protocol`) and the daemon (`roomcastd`):
//! - `RoomId` / `ClientId` identifiers
//! - `RoomSecret`, the deterministic per-room key
//! - `RoomCipher`, authenticated encryption of message text
//! - `Envelope`, the `sender:body` attribution framing
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod id;
pub mod secret;

// Re-exports for convenience
pub use cipher::{CipherError, RoomCipher, NONCE_SIZE, TAG_SIZE};
pub use envelope::{Envelope, DELIMITER};
pub use error::{CoreError, CoreResult};
pub use id::{ClientId, RoomId};
pub use secret::{RoomSecret, SECRET_HEX_LEN};
