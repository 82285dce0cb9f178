//! Core types and trait definitions for the Travia review-tagging pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! store backend (`travia-store-sqlite`) and the oracle client
//! (`travia-oracle`) implement the traits defined here; the batch jobs in
//! `travia-pipeline` only ever see the traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod character;
pub mod corpus;
pub mod error;
pub mod evidence;
pub mod oracle;
pub mod profile;
pub mod promotion;
pub mod review;
pub mod store;
pub mod tag;

pub use error::{Error, Result};
