//! Delayed completion of form submissions.
//!
//! Registration and profile edits are committed after an artificial delay
//! standing in for network latency. A [`Completion`] is a spawned task that
//! sleeps and then hands back its payload; it cannot be cancelled, and
//! [`Completion::wait`] consumes it, so each payload is delivered exactly once.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::Result;

/// Artificial delays applied before committing form submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
  pub registration:   Duration,
  pub profile_update: Duration,
}

impl Latency {
  /// No delay at all. Used by tests and the CLI.
  pub const NONE: Latency =
    Latency { registration: Duration::ZERO, profile_update: Duration::ZERO };

  pub fn from_millis(registration: u64, profile_update: u64) -> Self {
    Self {
      registration:   Duration::from_millis(registration),
      profile_update: Duration::from_millis(profile_update),
    }
  }
}

impl Default for Latency {
  fn default() -> Self { Self::from_millis(2000, 1500) }
}

/// A payload that becomes available after a fixed delay.
#[derive(Debug)]
pub struct Completion<T> {
  handle: JoinHandle<T>,
}

impl<T: Send + 'static> Completion<T> {
  /// Start the timer. Must be called within a tokio runtime.
  pub fn schedule(delay: Duration, payload: T) -> Self {
    let handle = tokio::spawn(async move {
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      payload
    });
    Self { handle }
  }

  /// Wait for the delay to elapse and take the payload.
  pub async fn wait(self) -> Result<T> { Ok(self.handle.await?) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn resolves_after_delay_with_payload() {
    let started = tokio::time::Instant::now();
    let completion = Completion::schedule(Duration::from_millis(50), "홍길동");

    assert_eq!(completion.wait().await.unwrap(), "홍길동");
    assert!(started.elapsed() >= Duration::from_millis(50));
  }

  #[tokio::test]
  async fn zero_delay_resolves_immediately() {
    let completion = Completion::schedule(Duration::ZERO, 7_u32);
    assert_eq!(completion.wait().await.unwrap(), 7);
  }

  #[test]
  fn default_latency_matches_form_delays() {
    let latency = Latency::default();
    assert_eq!(latency.registration, Duration::from_millis(2000));
    assert_eq!(latency.profile_update, Duration::from_millis(1500));
  }
}
