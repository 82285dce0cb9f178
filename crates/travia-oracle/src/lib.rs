//! An OpenAI-compatible chat-completions client implementing
//! [`travia_core::oracle::ClassificationOracle`].
//!
//! The client only speaks the wire protocol and parses replies into raw tag
//! lists and ids. Vocabulary containment and category validation stay in
//! [`travia_core::oracle::OracleAdapter`], which wraps this type.

mod client;
mod config;
mod error;
mod parse;
mod prompt;
mod wire;

pub use client::OpenAiOracle;
pub use config::OracleConfig;
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
