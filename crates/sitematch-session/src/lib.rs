//! Session and identity logic for sitematch.
//!
//! Everything here is generic over a
//! [`KeyValueStore`](sitematch_core::store::KeyValueStore); the concrete
//! backend is chosen by the binary.
//!
//! Layering, leaves first: [`repository`] owns every storage key, [`seed`]
//! fills it with fixtures, [`machine`] drives login and verification, and
//! [`router`] decides which role surface is mounted.

pub mod completion;
pub mod credentials;
pub mod error;
pub mod keys;
pub mod machine;
pub mod repository;
pub mod router;
pub mod seed;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
