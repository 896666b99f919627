//! Sender attribution framing.
//!
//! Every broadcast plaintext is `sender:body`. The framing is applied
//! before encryption so recipients can tell who spoke.

use std::fmt;

use crate::id::ClientId;

/// Separator between the sender and the body.
pub const DELIMITER: char = ':';

/// A message attributed to its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Who published the message (may be anonymous)
    pub sender: ClientId,
    /// Message text as published
    pub body: String,
}

impl Envelope {
    /// Creates a new envelope.
    pub fn new(sender: ClientId, body: impl Into<String>) -> Self {
        Self {
            sender,
            body: body.into(),
        }
    }

    /// Renders the framed plaintext.
    pub fn to_plaintext(&self) -> String {
        self.to_string()
    }

    /// Splits framed plaintext at the first delimiter.
    ///
    /// Returns `None` when no delimiter is present.
    pub fn parse(plaintext: &str) -> Option<Self> {
        let (sender, body) = plaintext.split_once(DELIMITER)?;
        let sender = ClientId::parse(sender).unwrap_or_else(|_| ClientId::anonymous());
        Some(Self::new(sender, body))
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.sender, self.body)
    }
}
