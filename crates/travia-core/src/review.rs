//! Reviewable entities — the input side of the pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::character::CategoryId;

// ─── Identity ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReviewId(pub i64);

impl fmt::Display for ReviewId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BookingId(pub i64);

/// The person a guide or traveler review is about.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SubjectId(pub i64);

impl fmt::Display for SubjectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which review table an entity lives in. Each kind has its own evidence
/// link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
  /// A traveler's review of a product. Tagged, never classified.
  Product,
  /// A traveler's review of their guide; evidence of the guide's character.
  Guide,
  /// A guide's review of a traveler; evidence of the traveler's character.
  Traveler,
}

impl ReviewKind {
  /// The kinds that go through character classification.
  pub const CHARACTER: [ReviewKind; 2] = [ReviewKind::Guide, ReviewKind::Traveler];

  pub fn is_classifiable(self) -> bool { !matches!(self, Self::Product) }
}

impl fmt::Display for ReviewKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Product => "product",
      Self::Guide => "guide",
      Self::Traveler => "traveler",
    })
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A review as seen by the selector: flat, with no navigation to bookings
/// or users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewableEntity {
  pub kind:         ReviewKind,
  pub review_id:    ReviewId,
  pub text:         String,
  /// Set at most once, by the classifier. Always `None` for product reviews.
  pub category_id:  Option<CategoryId>,
  /// Set when any pipeline run has finished with this review, including runs
  /// that found no evidence at all.
  pub processed_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
}

impl ReviewableEntity {
  /// A short prefix of the text for log lines.
  pub fn excerpt(&self, max_chars: usize) -> String {
    let mut out: String = self.text.chars().take(max_chars).collect();
    if self.text.chars().count() > max_chars {
      out.push('…');
    }
    out
  }
}
