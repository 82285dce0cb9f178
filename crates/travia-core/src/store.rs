//! The `TaggingStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `travia-store-sqlite`).
//! The batch jobs in `travia-pipeline` depend on this abstraction, not on any
//! concrete backend.

use std::{collections::BTreeMap, future::Future};

use crate::{
  character::CharacterRules,
  evidence::{CommitSummary, EvidenceBatch, EvidenceRecord, Provenance},
  profile::{CharacterTally, ProfileCharacter, ProfileRole},
  promotion::{ProductId, PromotedTag, TagCount},
  review::{ReviewKind, ReviewableEntity},
  tag::{TagId, TagType},
};

/// A promoted tag as stored, including manually curated rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedTagRecord {
  pub product_id: ProductId,
  pub tag_id:     TagId,
  pub name:       String,
  pub source:     Provenance,
}

/// What an atomic promoted-tag replacement changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
  pub deleted:  usize,
  pub inserted: usize,
}

/// Abstraction over the persistent store the pipeline reads and writes.
///
/// Every write method is atomic: it either applies completely or leaves the
/// store untouched.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait TaggingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Selection ─────────────────────────────────────────────────────────

  /// Reviews of `kind` that no run has processed yet, oldest first.
  fn unprocessed_reviews(
    &self,
    kind: ReviewKind,
  ) -> impl Future<Output = Result<Vec<ReviewableEntity>, Self::Error>> + Send + '_;

  // ── Reference data ────────────────────────────────────────────────────

  /// Every character with its rule tag names, in one bulk read.
  fn load_character_rules(
    &self,
  ) -> impl Future<Output = Result<Vec<CharacterRules>, Self::Error>> + Send + '_;

  /// Resolve `names` to tag ids, creating missing tags with `tag_type`.
  ///
  /// A concurrent creator winning the race for a name is not an error; the
  /// existing row is returned.
  fn get_or_create_tags(
    &self,
    names: Vec<String>,
    tag_type: TagType,
  ) -> impl Future<Output = Result<BTreeMap<String, TagId>, Self::Error>> + Send + '_;

  // ── Evidence ──────────────────────────────────────────────────────────

  /// Apply a whole run's staged evidence in one transaction.
  fn commit_evidence(
    &self,
    batch: EvidenceBatch,
  ) -> impl Future<Output = Result<CommitSummary, Self::Error>> + Send + '_;

  /// All evidence links for `kind`, ordered by review then tag.
  fn list_evidence(
    &self,
    kind: ReviewKind,
  ) -> impl Future<Output = Result<Vec<EvidenceRecord>, Self::Error>> + Send + '_;

  // ── Promotion ─────────────────────────────────────────────────────────

  /// Count AI evidence per (product, tag) through
  /// product → booking → review → evidence.
  fn product_tag_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<TagCount>, Self::Error>> + Send + '_;

  /// Delete every AI-provenance promoted tag and insert `promoted` in its
  /// place, in one transaction. Manual rows are never touched.
  fn replace_promoted_tags(
    &self,
    promoted: Vec<PromotedTag>,
  ) -> impl Future<Output = Result<ReplaceSummary, Self::Error>> + Send + '_;

  /// Promoted tags, optionally for one product, ordered by product then id.
  fn list_promoted_tags(
    &self,
    product_id: Option<ProductId>,
  ) -> impl Future<Output = Result<Vec<PromotedTagRecord>, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Classified review counts per (subject, character) for `kind`.
  fn character_tallies(
    &self,
    kind: ReviewKind,
  ) -> impl Future<Output = Result<Vec<CharacterTally>, Self::Error>> + Send + '_;

  /// Upsert representative characters; returns how many rows changed.
  fn upsert_profile_characters(
    &self,
    profiles: Vec<ProfileCharacter>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn list_profile_characters(
    &self,
    role: ProfileRole,
  ) -> impl Future<Output = Result<Vec<ProfileCharacter>, Self::Error>> + Send + '_;
}
