//! Tags — the shared controlled vocabulary.
//!
//! A tag is created lazily the first time any pipeline run needs it and is
//! never mutated afterwards. The same table backs product tags, character
//! evidence and the admin-curated character rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl fmt::Display for TagId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Where a tag first came from. Recorded once at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
  /// Seeded by an administrator as part of a character rule.
  Curated,
  /// Created by open-vocabulary extraction over product reviews.
  AiExtracted,
  /// Created by character extraction over guide/traveler reviews.
  CharacterKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id:   TagId,
  pub name:     String,
  pub tag_type: TagType,
}

// ─── Quality heuristics ──────────────────────────────────────────────────────

/// Substrings that mark a tag as administrative noise rather than content.
///
/// These are the words the extraction model tends to leak when it has
/// nothing useful to say ("no keywords", "extracted tag", "place", ...).
pub const DEFAULT_DENYLIST: &[&str] = &[
  "반환", "추출", "없음", "키워드", "해당", "태그", "장소", "지역", "음식",
  "물건", "활동", "경험", "역사와", "식도락", "아무것도",
];

/// Why a tag name failed the [`TagFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
  TooShort,
  /// Longer than `max_length`; almost always a sentence, not a tag.
  TooLong,
  Denylisted(String),
}

/// String heuristics deciding whether a tag name is worth keeping.
///
/// Lengths are counted in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagFilter {
  pub denylist:   Vec<String>,
  pub min_length: usize,
  pub max_length: usize,
}

impl Default for TagFilter {
  fn default() -> Self {
    Self {
      denylist:   DEFAULT_DENYLIST.iter().map(|s| (*s).to_owned()).collect(),
      min_length: 2,
      max_length: 14,
    }
  }
}

impl TagFilter {
  /// A filter that only enforces the length bounds.
  pub fn lengths(min_length: usize, max_length: usize) -> Self {
    Self { denylist: Vec::new(), min_length, max_length }
  }

  pub fn with_denylist<I, S>(mut self, words: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.denylist = words.into_iter().map(Into::into).collect();
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.min_length > self.max_length {
      return Err(Error::InvalidFilter {
        min: self.min_length,
        max: self.max_length,
      });
    }
    Ok(())
  }

  /// Return the first reason `name` is rejected, or `None` if it passes.
  pub fn rejection(&self, name: &str) -> Option<Rejection> {
    let chars = name.chars().count();
    if chars < self.min_length {
      return Some(Rejection::TooShort);
    }
    if chars > self.max_length {
      return Some(Rejection::TooLong);
    }
    self
      .denylist
      .iter()
      .find(|word| !word.is_empty() && name.contains(word.as_str()))
      .map(|word| Rejection::Denylisted(word.clone()))
  }

  pub fn admits(&self, name: &str) -> bool { self.rejection(name).is_none() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn length_is_counted_in_characters() {
    let filter = TagFilter::lengths(2, 4);
    // Four Hangul syllables are twelve bytes but four characters.
    assert!(filter.admits("사진촬영"));
    assert_eq!(filter.rejection("사진촬영함"), Some(Rejection::TooLong));
    assert_eq!(filter.rejection("-"), Some(Rejection::TooShort));
  }

  #[test]
  fn denylist_matches_substrings() {
    let filter = TagFilter::default();
    assert_eq!(
      filter.rejection("추출된태그"),
      Some(Rejection::Denylisted("추출".into()))
    );
    assert!(filter.admits("야경"));
  }

  #[test]
  fn empty_denylist_entries_never_match() {
    let filter = TagFilter::lengths(1, 10).with_denylist([""]);
    assert!(filter.admits("야경"));
  }

  #[test]
  fn validate_rejects_inverted_bounds() {
    assert!(TagFilter::lengths(5, 2).validate().is_err());
    assert!(TagFilter::default().validate().is_ok());
  }
}
