//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Enums are stored as their
//! lowercase snake_case names. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, Utc};
use travia_core::{
  character::CategoryId,
  evidence::{EvidenceRecord, Provenance},
  profile::ProfileRole,
  review::{ReviewId, ReviewKind, ReviewableEntity},
  store::PromotedTagRecord,
  promotion::ProductId,
  tag::{TagId, TagType},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ────────────────────────────────────────────────────────────────────

pub fn encode_tag_type(t: TagType) -> &'static str {
  match t {
    TagType::Curated => "curated",
    TagType::AiExtracted => "ai_extracted",
    TagType::CharacterKeyword => "character_keyword",
  }
}

pub fn decode_tag_type(s: &str) -> Result<TagType> {
  match s {
    "curated" => Ok(TagType::Curated),
    "ai_extracted" => Ok(TagType::AiExtracted),
    "character_keyword" => Ok(TagType::CharacterKeyword),
    other => Err(Error::UnknownValue { column: "tag_type", value: other.to_owned() }),
  }
}

pub fn encode_provenance(p: Provenance) -> &'static str {
  match p {
    Provenance::Ai => "ai",
    Provenance::Manual => "manual",
  }
}

pub fn decode_provenance(s: &str) -> Result<Provenance> {
  match s {
    "ai" => Ok(Provenance::Ai),
    "manual" => Ok(Provenance::Manual),
    other => Err(Error::UnknownValue { column: "source", value: other.to_owned() }),
  }
}

pub fn encode_role(r: ProfileRole) -> &'static str {
  match r {
    ProfileRole::Guide => "guide",
    ProfileRole::Traveler => "traveler",
  }
}

pub fn decode_role(s: &str) -> Result<ProfileRole> {
  match s {
    "guide" => Ok(ProfileRole::Guide),
    "traveler" => Ok(ProfileRole::Traveler),
    other => Err(Error::UnknownValue { column: "role", value: other.to_owned() }),
  }
}

// ─── ReviewKind → tables ──────────────────────────────────────────────────────

/// The review table for `kind`.
pub fn review_table(kind: ReviewKind) -> &'static str {
  match kind {
    ReviewKind::Product => "product_reviews",
    ReviewKind::Guide => "guide_reviews",
    ReviewKind::Traveler => "traveler_reviews",
  }
}

/// The evidence link table for `kind`.
pub fn link_table(kind: ReviewKind) -> &'static str {
  match kind {
    ReviewKind::Product => "product_review_tags",
    ReviewKind::Guide => "guide_review_tags",
    ReviewKind::Traveler => "traveler_review_tags",
  }
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// A review row as read from SQLite, before decoding.
pub struct RawReview {
  pub review_id:    i64,
  pub text:         String,
  pub category_id:  Option<i64>,
  pub processed_at: Option<String>,
  pub created_at:   String,
}

impl RawReview {
  pub fn into_entity(self, kind: ReviewKind) -> Result<ReviewableEntity> {
    Ok(ReviewableEntity {
      kind,
      review_id: ReviewId(self.review_id),
      text: self.text,
      category_id: self.category_id.map(CategoryId),
      processed_at: self.processed_at.as_deref().map(decode_dt).transpose()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawEvidence {
  pub review_id:   i64,
  pub tag_id:      i64,
  pub tag_name:    String,
  pub source:      String,
  pub run_id:      Option<String>,
  pub recorded_at: String,
}

impl RawEvidence {
  pub fn into_record(self, kind: ReviewKind) -> Result<EvidenceRecord> {
    Ok(EvidenceRecord {
      kind,
      review_id: ReviewId(self.review_id),
      tag_id: TagId(self.tag_id),
      tag_name: self.tag_name,
      source: decode_provenance(&self.source)?,
      run_id: self.run_id.as_deref().map(decode_uuid).transpose()?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

pub struct RawPromoted {
  pub product_id: i64,
  pub tag_id:     i64,
  pub name:       String,
  pub source:     String,
}

impl RawPromoted {
  pub fn into_record(self) -> Result<PromotedTagRecord> {
    Ok(PromotedTagRecord {
      product_id: ProductId(self.product_id),
      tag_id:     TagId(self.tag_id),
      name:       self.name,
      source:     decode_provenance(&self.source)?,
    })
  }
}
