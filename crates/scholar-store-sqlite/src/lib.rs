//! [`KvStore`](scholar_core::store::KvStore) over a single SQLite table.
//!
//! Queries go through [`tokio_rusqlite`], which owns the connection on its
//! own thread.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
