//! Learner identity and storage key derivation

use crate::{messages, Error, Result};
use serde::{Deserialize, Serialize};

/// Fixed namespace prefix for per-identity snapshot keys
pub const STORAGE_KEY_PREFIX: &str = "tunemap_v1_";

/// A learner's declared identity: group (class), seat and display name.
///
/// Immutable once set for a session except by explicit sign-out. Used only
/// to derive a storage key and to stamp recorded attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Group / class label
    pub group: String,
    /// Seat label within the group
    pub seat: String,
    /// Display name
    pub name: String,
}

impl Identity {
    pub fn new(group: impl Into<String>, seat: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            seat: seat.into(),
            name: name.into(),
        }
    }

    /// Reject identities with any empty or whitespace-only field
    pub fn validate(&self) -> Result<()> {
        if self.group.trim().is_empty() || self.seat.trim().is_empty() || self.name.trim().is_empty()
        {
            return Err(Error::Validation(messages::MSG_IDENTITY_INCOMPLETE.to_string()));
        }
        Ok(())
    }

    /// Deterministic snapshot key: fixed prefix plus the three fields
    pub fn storage_key(&self) -> String {
        format!(
            "{}{}_{}_{}",
            STORAGE_KEY_PREFIX, self.group, self.seat, self.name
        )
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{} {}", self.group, self.seat, self.name)
    }
}
