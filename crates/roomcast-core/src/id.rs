//! Room and client identifiers.

use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Identifier of a broadcast room.
///
/// Opaque, caller-supplied and never empty once parsed. It is both the
/// registry key and the only input to secret derivation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Parses a room identifier, rejecting the empty string.
    pub fn parse(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::EmptyIdentifier { kind: "room id" });
        }
        Ok(Self(id))
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a client within a room.
///
/// Unique per room, not globally. Subscribers must supply a non-empty
/// value; publishers may be anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ClientId(String);

impl ClientId {
    /// Parses a client identifier, rejecting the empty string.
    pub fn parse(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::EmptyIdentifier { kind: "client id" });
        }
        Ok(Self(id))
    }

    /// The empty identifier used for publishers that did not name themselves.
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    /// Checks if this is the anonymous identifier.
    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
