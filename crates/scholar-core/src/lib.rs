//! Domain model and rules for Scholar.
//!
//! Owns the lesson graph and its editor, the conversion between the graph and
//! the stored lesson list, enrollment and progress bookkeeping, and the
//! XP/level rules. No HTTP or SQL here; storage is reached through
//! [`store::KvStore`].

pub mod achievement;
pub mod adapter;
pub mod classroom;
pub mod community;
pub mod course;
pub mod editor;
pub mod error;
pub mod graph;
pub mod profile;
pub mod progress;
pub mod reset;
pub mod reward;
pub mod store;

pub use error::{Error, Result};
