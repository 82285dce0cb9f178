//! Evidence links and the in-memory staging area for one batch run.
//!
//! Nothing in this module touches the store. A run calls
//! [`EvidenceBatch::persist`] once per processed review and hands the whole
//! batch to [`crate::store::TaggingStore::commit_evidence`] at the end, which
//! applies it in a single transaction.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  character::CategoryId,
  review::{ReviewId, ReviewKind, ReviewableEntity},
  tag::{TagId, TagType},
};

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Who produced an evidence link or a promoted tag.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  #[default]
  Ai,
  /// Curated by a person; never deleted or counted by the pipeline.
  Manual,
}

/// A persisted evidence link, joined with its tag name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
  pub kind:        ReviewKind,
  pub review_id:   ReviewId,
  pub tag_id:      TagId,
  pub tag_name:    String,
  pub source:      Provenance,
  /// The run that wrote this link; `None` for manual links.
  pub run_id:      Option<Uuid>,
  pub recorded_at: DateTime<Utc>,
}

// ─── Staging ─────────────────────────────────────────────────────────────────

/// The staged outcome for one review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEvidence {
  pub kind:        ReviewKind,
  pub review_id:   ReviewId,
  /// Tag names, deduplicated, in extraction order. May be empty: the review
  /// is still stamped as processed.
  pub tags:        Vec<String>,
  pub category_id: Option<CategoryId>,
}

/// All writes produced by one run, waiting for the single commit.
#[derive(Debug, Clone)]
pub struct EvidenceBatch {
  run_id:   Uuid,
  tag_type: TagType,
  items:    Vec<StagedEvidence>,
}

impl EvidenceBatch {
  /// `tag_type` is assigned to any tag this batch has to create.
  pub fn new(run_id: Uuid, tag_type: TagType) -> Self {
    Self { run_id, tag_type, items: Vec::new() }
  }

  pub fn run_id(&self) -> Uuid { self.run_id }

  pub fn tag_type(&self) -> TagType { self.tag_type }

  pub fn items(&self) -> &[StagedEvidence] { &self.items }

  pub fn len(&self) -> usize { self.items.len() }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Stage the evidence for `entity`.
  ///
  /// The category is dropped for kinds that are never classified. Duplicate
  /// tag names collapse to one link.
  pub fn persist(
    &mut self,
    entity: &ReviewableEntity,
    tags: Vec<String>,
    category_id: Option<CategoryId>,
  ) {
    let category_id = if entity.kind.is_classifiable() {
      category_id
    } else {
      if category_id.is_some() {
        tracing::warn!(
          review_id = %entity.review_id,
          kind = %entity.kind,
          "dropping category for a kind that is never classified"
        );
      }
      None
    };

    let mut seen = BTreeSet::new();
    let tags = tags
      .into_iter()
      .filter(|t| seen.insert(t.clone()))
      .collect();

    self.items.push(StagedEvidence {
      kind: entity.kind,
      review_id: entity.review_id,
      tags,
      category_id,
    });
  }

  /// Every distinct tag name across the batch, for one vocabulary lookup.
  pub fn tag_names(&self) -> BTreeSet<String> {
    self
      .items
      .iter()
      .flat_map(|item| item.tags.iter().cloned())
      .collect()
  }
}

/// What a committed batch actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
  pub reviews_stamped: usize,
  pub links_inserted:  usize,
  pub tags_created:    usize,
  /// Reviews another writer had already processed by commit time.
  pub skipped_stale:   usize,
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn entity(kind: ReviewKind, id: i64) -> ReviewableEntity {
    ReviewableEntity {
      kind,
      review_id: ReviewId(id),
      text: "친절하고 유쾌한 가이드".into(),
      category_id: None,
      processed_at: None,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn persist_deduplicates_tags_in_order() {
    let mut batch = EvidenceBatch::new(Uuid::new_v4(), TagType::CharacterKeyword);
    batch.persist(
      &entity(ReviewKind::Guide, 1),
      vec!["친절함".into(), "유머".into(), "친절함".into()],
      Some(CategoryId(3)),
    );

    let item = &batch.items()[0];
    assert_eq!(item.tags, vec!["친절함", "유머"]);
    assert_eq!(item.category_id, Some(CategoryId(3)));
  }

  #[test]
  fn product_reviews_never_carry_a_category() {
    let mut batch = EvidenceBatch::new(Uuid::new_v4(), TagType::AiExtracted);
    batch.persist(
      &entity(ReviewKind::Product, 7),
      vec!["야경".into()],
      Some(CategoryId(1)),
    );
    assert_eq!(batch.items()[0].category_id, None);
  }

  #[test]
  fn empty_evidence_is_still_staged() {
    let mut batch = EvidenceBatch::new(Uuid::new_v4(), TagType::AiExtracted);
    batch.persist(&entity(ReviewKind::Product, 2), Vec::new(), None);
    assert_eq!(batch.len(), 1);
    assert!(batch.tag_names().is_empty());
  }

  #[test]
  fn tag_names_span_the_whole_batch() {
    let mut batch = EvidenceBatch::new(Uuid::new_v4(), TagType::AiExtracted);
    batch.persist(&entity(ReviewKind::Product, 1), vec!["야경".into()], None);
    batch.persist(
      &entity(ReviewKind::Product, 2),
      vec!["야경".into(), "주차불편".into()],
      None,
    );
    let names: Vec<_> = batch.tag_names().into_iter().collect();
    assert_eq!(names, vec!["야경", "주차불편"]);
  }
}
