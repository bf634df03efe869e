//! Core types and trait definitions for the sitematch platform.
//!
//! Identities, profiles, sessions, and sites, plus the [`store::KeyValueStore`]
//! contract the session logic is written against. No storage backend lives
//! here.

// Store impls write `async fn` against the `impl Future + Send` signatures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod profile;
pub mod session;
pub mod site;
pub mod store;

pub use error::{Error, Result};
