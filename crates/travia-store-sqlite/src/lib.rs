//! SQLite backend for the Travia tagging pipeline.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod seed;
mod store;
mod vocabulary;

pub mod error;

pub use error::{Error, Result};
pub use seed::NewCharacter;
pub use store::SqliteStore;
