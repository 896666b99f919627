//! Attach and publish request parameters.
//!
//! Params structs mirror what arrives on the wire (every field optional);
//! `validate` turns them into requests whose identifiers are known to be
//! non-empty. Validation never touches hub state.

use roomcast_core::{ClientId, RoomId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only HTTP method accepted for publishing. HTTP methods are case-sensitive.
pub const PUBLISH_METHOD: &str = "POST";

/// Reasons a request is rejected before reaching the hub.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Room ID is required")]
    MissingRoomId,

    #[error("Client ID is required")]
    MissingClientId,

    #[error("Message is required")]
    MissingMessage,

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ValidationError {
    /// HTTP status code for this rejection.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingRoomId | Self::MissingClientId | Self::MissingMessage => 400,
            Self::MethodNotAllowed => 405,
        }
    }
}

// ============================================================================
// Attach
// ============================================================================

/// Raw parameters of a subscribe request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachParams {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl AttachParams {
    /// Validates the parameters. The room is checked before the client.
    pub fn validate(self) -> Result<AttachRequest, ValidationError> {
        let room_id = self
            .room_id
            .and_then(|r| RoomId::parse(r).ok())
            .ok_or(ValidationError::MissingRoomId)?;
        let client_id = self
            .client_id
            .and_then(|c| ClientId::parse(c).ok())
            .ok_or(ValidationError::MissingClientId)?;

        Ok(AttachRequest { room_id, client_id })
    }
}

/// A validated subscribe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachRequest {
    pub room_id: RoomId,
    pub client_id: ClientId,
}

// ============================================================================
// Publish
// ============================================================================

/// Raw parameters of a publish request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishParams {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PublishParams {
    /// Layers these (body) values over `query` values, field by field.
    pub fn merge_over(self, query: PublishParams) -> PublishParams {
        PublishParams {
            room_id: self.room_id.or(query.room_id),
            client_id: self.client_id.or(query.client_id),
            message: self.message.or(query.message),
        }
    }

    /// Validates the parameters for the given HTTP method.
    ///
    /// The method is checked first, then the room, then the message. A
    /// missing client id is allowed and yields an anonymous publisher.
    pub fn validate(self, method: &str) -> Result<PublishRequest, ValidationError> {
        if method != PUBLISH_METHOD {
            return Err(ValidationError::MethodNotAllowed);
        }

        let room_id = self
            .room_id
            .and_then(|r| RoomId::parse(r).ok())
            .ok_or(ValidationError::MissingRoomId)?;

        let message = self
            .message
            .filter(|m| !m.is_empty())
            .ok_or(ValidationError::MissingMessage)?;

        let client_id = self
            .client_id
            .and_then(|c| ClientId::parse(c).ok())
            .unwrap_or_else(ClientId::anonymous);

        Ok(PublishRequest {
            room_id,
            client_id,
            message,
        })
    }
}

/// A validated publish request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub room_id: RoomId,
    pub client_id: ClientId,
    pub message: String,
}
