//! Authenticated encryption of room traffic using ChaCha20-Poly1305.
//!
//! Wire text is standard base64 of `nonce || ciphertext || tag`. Every
//! call to [`RoomCipher::encrypt`] draws a fresh random nonce, so the same
//! plaintext never produces the same wire text twice.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use thiserror::Error;

use crate::secret::RoomSecret;

/// Nonce size for ChaCha20-Poly1305
pub const NONCE_SIZE: usize = 12;

/// Tag size for ChaCha20-Poly1305
pub const TAG_SIZE: usize = 16;

/// Errors produced while sealing or opening a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The wire text is not valid base64.
    #[error("ciphertext is not valid base64")]
    Encoding,

    /// The decoded payload is too short to hold a nonce and tag.
    #[error("ciphertext truncated: {len} bytes (min: {min})")]
    Truncated { len: usize, min: usize },

    /// Tag verification failed (wrong key or tampered payload).
    #[error("ciphertext failed authentication")]
    Authentication,

    /// The decrypted bytes are not UTF-8.
    #[error("plaintext is not valid UTF-8")]
    Utf8,

    /// The AEAD refused to encrypt.
    #[error("encryption failed")]
    Seal,
}

/// Cipher bound to one room's secret.
#[derive(Clone)]
pub struct RoomCipher {
    cipher: ChaCha20Poly1305,
}

impl RoomCipher {
    /// Creates a cipher keyed by the room secret.
    pub fn new(secret: &RoomSecret) -> Self {
        let key = Key::from_slice(secret.key_bytes());
        Self {
            cipher: ChaCha20Poly1305::new(key),
        }
    }

    /// Encrypts UTF-8 text and returns base64 wire text.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Seal)?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + sealed.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&sealed);
        Ok(STANDARD.encode(payload))
    }

    /// Decrypts base64 wire text produced by [`RoomCipher::encrypt`].
    pub fn decrypt(&self, wire: &str) -> Result<String, CipherError> {
        let payload = STANDARD.decode(wire).map_err(|_| CipherError::Encoding)?;

        let min = NONCE_SIZE + TAG_SIZE;
        if payload.len() < min {
            return Err(CipherError::Truncated {
                len: payload.len(),
                min,
            });
        }

        let (nonce, sealed) = payload.split_at(NONCE_SIZE);
        let opened = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Authentication)?;

        String::from_utf8(opened).map_err(|_| CipherError::Utf8)
    }
}

impl std::fmt::Debug for RoomCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher_for(room: &str) -> RoomCipher {
        RoomCipher::new(&RoomSecret::derive_str(room))
    }

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = cipher_for("alpha");
        let wire = cipher.encrypt("carol:hi").unwrap();
        assert_eq!(cipher.decrypt(&wire).unwrap(), "carol:hi");
    }

    #[test]
    fn test_roundtrip_unicode_and_empty() {
        let cipher = cipher_for("alpha");
        for text in ["", "héllo wörld", "line one\nline two", "a:b:c"] {
            let wire = cipher.encrypt(text).unwrap();
            assert_eq!(cipher.decrypt(&wire).unwrap(), text);
        }
    }

    #[test]
    fn test_same_plaintext_differs_on_wire() {
        let cipher = cipher_for("alpha");
        let first = cipher.encrypt("hi").unwrap();
        let second = cipher.encrypt("hi").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_independently_derived_cipher_decrypts() {
        let wire = cipher_for("alpha").encrypt("hi").unwrap();
        assert_eq!(cipher_for("alpha").decrypt(&wire).unwrap(), "hi");
    }

    #[test]
    fn test_wrong_room_fails() {
        let wire = cipher_for("alpha").encrypt("secret").unwrap();
        assert_eq!(
            cipher_for("beta").decrypt(&wire),
            Err(CipherError::Authentication)
        );
    }

    #[test]
    fn test_tampered_payload_fails() {
        let cipher = cipher_for("alpha");
        let wire = cipher.encrypt("secret").unwrap();
        let mut payload = STANDARD.decode(&wire).unwrap();
        let last = payload.len() - 1;
        payload[last] ^= 0x01;
        let tampered = STANDARD.encode(payload);
        assert_eq!(cipher.decrypt(&tampered), Err(CipherError::Authentication));
    }

    #[test]
    fn test_malformed_inputs() {
        let cipher = cipher_for("alpha");
        assert_eq!(cipher.decrypt("not base64!!"), Err(CipherError::Encoding));

        let short = STANDARD.encode([0u8; 8]);
        assert_eq!(
            cipher.decrypt(&short),
            Err(CipherError::Truncated { len: 8, min: 28 })
        );
    }
}
