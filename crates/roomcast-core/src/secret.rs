//! Deterministic per-room secrets.
//!
//! A room's secret is the lowercase hex SHA-256 digest of its identifier.
//! Anyone who knows the identifier can compute it: the secret namespaces
//! traffic per room, it is not an access credential.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::id::RoomId;

/// Length of the hex-encoded secret.
pub const SECRET_HEX_LEN: usize = 64;

/// Symmetric secret derived from a room identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct RoomSecret {
    digest: [u8; 32],
}

impl RoomSecret {
    /// Derives the secret for a room.
    pub fn derive(room_id: &RoomId) -> Self {
        Self::derive_str(room_id.as_str())
    }

    /// Derives the secret for an arbitrary string, including the empty one.
    pub fn derive_str(input: &str) -> Self {
        Self {
            digest: Sha256::digest(input.as_bytes()).into(),
        }
    }

    /// Raw 32-byte key material.
    pub fn key_bytes(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Hex rendering of the secret.
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

// Keep key material out of logs.
impl fmt::Debug for RoomSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomSecret").finish_non_exhaustive()
    }
}
