//! Error types for `travia-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No characters are defined, so there is nothing to classify against.
  #[error("rule corpus is empty: no characters are defined")]
  CorpusEmpty,

  #[error("invalid tag filter: min_length {min} exceeds max_length {max}")]
  InvalidFilter { min: usize, max: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
