//! Participant identity.
//!
//! The relay assigns every WebSocket connection a fresh random identity.
//! Clients never choose their own; whatever `Ident` a client sends is
//! overwritten before the guess is re-broadcast.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one relay participant, rendered as 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdent(String);

impl ClientIdent {
    /// Generate a new random identity (UUID v4, simple form).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ClientIdent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ClientIdent> for String {
    fn from(id: ClientIdent) -> Self {
        id.0
    }
}
