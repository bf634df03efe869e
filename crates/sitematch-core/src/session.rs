//! Sessions: who is currently authenticated, and in which role.

use serde::{Deserialize, Serialize};

use crate::identity::{Identity, Role};

/// The active login. A projection of an [`Identity`], never a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub role:        Role,
  pub identity:    Identity,
  /// Whether the session is kept in the durable tier.
  pub remember_me: bool,
}

impl Session {
  /// The role is always derived from the identity variant.
  pub fn new(identity: Identity, remember_me: bool) -> Self {
    Self { role: identity.role(), identity, remember_me }
  }

  pub fn is_registered(&self) -> bool { self.identity.is_registered() }
}
