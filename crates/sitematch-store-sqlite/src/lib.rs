//! SQLite backend for the sitematch persistence adapter.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The durable tier is a SQLite file; the
//! ephemeral tier is a private in-memory database that disappears with the
//! process.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
