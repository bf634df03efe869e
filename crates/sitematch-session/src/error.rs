//! Error type for `sitematch-session`.

use sitematch_core::identity::PhoneNumber;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("core error: {0}")]
  Core(#[from] sitematch_core::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("password hash error: {0}")]
  PasswordHash(String),

  /// Only registered workers belong in the worker index.
  #[error("worker {0} is not registered")]
  WorkerNotRegistered(PhoneNumber),

  #[error("a profile already exists for {0}")]
  ProfileExists(PhoneNumber),

  #[error("profile phone {found} does not match {expected}")]
  ProfilePhoneMismatch {
    expected: PhoneNumber,
    found:    PhoneNumber,
  },

  #[error("unknown admin account: {0}")]
  UnknownAdmin(String),

  #[error("completion task failed: {0}")]
  Completion(#[from] tokio::task::JoinError),
}

impl Error {
  /// Box any backend error.
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
