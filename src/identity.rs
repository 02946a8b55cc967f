//! Acting-identity collaborator contract.
//!
//! The store attributes mutations to an [`Identity`] but never
//! authenticates one. Constructing an `Identity` is the caller's auth
//! boundary; without one, attribution-gated mutations are unavailable while
//! read-side queries keep working.

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// The current acting user as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id.
    pub id: UserId,
    /// Display name used in notification messages.
    pub name: String,
    /// Role of the user.
    pub role: Role,
}

impl Identity {
    /// Convenience constructor.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}
