//! [`SqliteStore`], the SQLite implementation of [`KeyValueStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio_rusqlite::Connection;

use sitematch_core::store::{KeyValueStore, Tier};

use crate::{Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A two-tier key/value store.
///
/// Cloning is cheap: both inner connections are reference-counted, and
/// clones share the same ephemeral tier.
#[derive(Clone)]
pub struct SqliteStore {
  durable:   Connection,
  ephemeral: Connection,
}

impl SqliteStore {
  /// Open (or create) the durable tier at `path` with a fresh ephemeral tier.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let durable   = Connection::open(path).await?;
    let ephemeral = Connection::open_in_memory().await?;
    Self::init(durable, ephemeral).await
  }

  /// Open a store whose tiers are both in memory. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let durable   = Connection::open_in_memory().await?;
    let ephemeral = Connection::open_in_memory().await?;
    Self::init(durable, ephemeral).await
  }

  async fn init(durable: Connection, ephemeral: Connection) -> Result<Self> {
    let store = Self { durable, ephemeral };
    for tier in Tier::ALL {
      store
        .conn(tier)
        .call(|conn| {
          conn.execute_batch(SCHEMA)?;
          Ok(())
        })
        .await?;
    }
    Ok(store)
  }

  fn conn(&self, tier: Tier) -> &Connection {
    match tier {
      Tier::Durable => &self.durable,
      Tier::Ephemeral => &self.ephemeral,
    }
  }

  /// All keys currently held in `tier`, sorted.
  pub async fn keys(&self, tier: Tier) -> Result<Vec<String>> {
    let keys = self
      .conn(tier)
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(keys)
  }

  async fn put(&self, tier: Tier, key: &str, value: &str) -> Result<()> {
    let key    = key.to_owned();
    let value  = value.to_owned();
    let at_str = Utc::now().to_rfc3339();

    self
      .conn(tier)
      .call(move |conn| {
        conn.execute(
          "INSERT INTO entries (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value      = excluded.value,
             updated_at = excluded.updated_at",
          rusqlite::params![key, value, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, tier: Tier, key: &str) -> Result<()> {
    let key = key.to_owned();

    self
      .conn(tier)
      .call(move |conn| {
        conn.execute("DELETE FROM entries WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── KeyValueStore impl ──────────────────────────────────────────────────────

impl KeyValueStore for SqliteStore {
  type Error = crate::Error;

  async fn get(&self, tier: Tier, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();

    let value: Option<String> = self
      .conn(tier)
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM entries WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(value)
  }

  async fn set(&self, tier: Tier, key: &str, value: &str) -> Result<()> {
    self.put(tier, key, value).await
  }

  async fn remove(&self, tier: Tier, key: &str) -> Result<()> {
    self.delete(tier, key).await
  }

  async fn set_session(&self, key: &str, value: &str, remember: bool) -> Result<()> {
    let (target, other) = if remember {
      (Tier::Durable, Tier::Ephemeral)
    } else {
      (Tier::Ephemeral, Tier::Durable)
    };
    self.put(target, key, value).await?;
    self.delete(other, key).await
  }

  async fn remove_session(&self, key: &str) -> Result<()> {
    for tier in Tier::ALL {
      self.delete(tier, key).await?;
    }
    Ok(())
  }
}
