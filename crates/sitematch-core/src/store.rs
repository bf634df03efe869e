//! The `KeyValueStore` trait: the persistence adapter contract.
//!
//! The trait is implemented by storage backends (e.g.
//! `sitematch-store-sqlite`). Higher layers (`sitematch-session`,
//! `sitematch-cli`) depend on this abstraction, not on any concrete backend.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Which storage tier a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  /// Survives restarts.
  Durable,
  /// Cleared when the current run ends.
  Ephemeral,
}

impl Tier {
  pub const ALL: [Tier; 2] = [Tier::Durable, Tier::Ephemeral];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Durable => "durable",
      Self::Ephemeral => "ephemeral",
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// String key/value storage over two tiers.
///
/// Values are opaque strings; decoding them is the caller's job, and a value
/// that fails to decode is the caller's failure, not the store's.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait KeyValueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read `key` from `tier`. Returns `None` if absent.
  fn get<'a>(
    &'a self,
    tier: Tier,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Write `value` under `key` in `tier`, replacing any previous value.
  fn set<'a>(
    &'a self,
    tier: Tier,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove `key` from `tier`. Removing an absent key is not an error.
  fn remove<'a>(
    &'a self,
    tier: Tier,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Write a session record to exactly one tier.
  ///
  /// With `remember` the value goes to [`Tier::Durable`] and the ephemeral
  /// copy is cleared; without it the value goes to [`Tier::Ephemeral`] and the
  /// durable copy is cleared. The tiers never both hold `key` afterwards.
  fn set_session<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
    remember: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove `key` from both tiers. Idempotent.
  fn remove_session<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
