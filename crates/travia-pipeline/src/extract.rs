//! The two extraction jobs: open-vocabulary tagging of product reviews, and
//! closed-vocabulary tagging plus classification of guide and traveler
//! reviews.
//!
//! Both walk their selection one review at a time, stage the outcome in an
//! [`EvidenceBatch`], and commit the batch once at the end. An oracle failure
//! only costs that one review, which stays unprocessed for the next run. Any
//! failure while committing rolls the whole run back.

use travia_core::{
  character::CategoryId,
  corpus::{ExtractionPolicy, RuleCorpus, Vocabulary},
  evidence::{CommitSummary, EvidenceBatch},
  oracle::{ClassificationOracle, OracleAdapter},
  review::ReviewableEntity,
  store::TaggingStore,
  tag::TagType,
};
use uuid::Uuid;

use crate::{PipelineError, Result, build_corpus, select_unclassified, select_untagged};

const EXCERPT_CHARS: usize = 30;

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What happened to one review within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
  /// Tags staged on a kind that is never classified.
  Tagged,
  /// Tags staged and a category assigned.
  Classified(CategoryId),
  /// Tags staged but the classifier gave no usable id. The review is still
  /// stamped, so it is not classified again.
  Unclassified,
  /// No tags; stamped as processed with no evidence.
  NoEvidence,
  /// The oracle failed; nothing staged, retried next run.
  Skipped,
}

/// Counts for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub run_id:       Uuid,
  pub selected:     usize,
  pub tagged:       usize,
  pub classified:   usize,
  pub unclassified: usize,
  pub no_evidence:  usize,
  pub skipped:      usize,
  pub commit:       CommitSummary,
}

impl RunSummary {
  fn new(run_id: Uuid, selected: usize) -> Self {
    Self { run_id, selected, ..Default::default() }
  }

  fn record(&mut self, outcome: ItemOutcome) {
    match outcome {
      ItemOutcome::Tagged => self.tagged += 1,
      ItemOutcome::Classified(_) => self.classified += 1,
      ItemOutcome::Unclassified => self.unclassified += 1,
      ItemOutcome::NoEvidence => self.no_evidence += 1,
      ItemOutcome::Skipped => self.skipped += 1,
    }
  }
}

async fn commit<S: TaggingStore>(store: &S, batch: EvidenceBatch) -> Result<CommitSummary> {
  if batch.is_empty() {
    return Ok(CommitSummary::default());
  }
  let staged = batch.len();
  let summary = store
    .commit_evidence(batch)
    .await
    .map_err(PipelineError::commit)?;
  tracing::debug!(staged, stamped = summary.reviews_stamped, "batch committed");
  if summary.skipped_stale > 0 {
    tracing::warn!(
      stale = summary.skipped_stale,
      "some reviews were processed by another run before this commit"
    );
  }
  Ok(summary)
}

// ─── Product reviews ─────────────────────────────────────────────────────────

/// Tag every unprocessed product review with open-vocabulary tags.
pub async fn tag_reviews<S, O>(
  store: &S,
  oracle: &OracleAdapter<O>,
  policy: &ExtractionPolicy,
) -> Result<RunSummary>
where
  S: TaggingStore,
  O: ClassificationOracle,
{
  policy.filter.validate()?;

  let run_id = Uuid::new_v4();
  let reviews = select_untagged(store).await?;
  let mut summary = RunSummary::new(run_id, reviews.len());
  if reviews.is_empty() {
    tracing::info!(%run_id, "no product reviews to tag");
    return Ok(summary);
  }
  tracing::info!(%run_id, reviews = reviews.len(), "tagging product reviews");

  let vocabulary = Vocabulary::Open(policy.clone());
  let mut batch = EvidenceBatch::new(run_id, TagType::AiExtracted);

  for review in &reviews {
    let outcome = match oracle.extract(&review.text, &vocabulary).await {
      Ok(tags) => {
        let outcome = if tags.is_empty() { ItemOutcome::NoEvidence } else { ItemOutcome::Tagged };
        tracing::debug!(review_id = %review.review_id, ?tags, "tags extracted");
        batch.persist(review, tags, None);
        outcome
      }
      Err(e) => {
        skip(review, &e);
        ItemOutcome::Skipped
      }
    };
    summary.record(outcome);
  }

  summary.commit = commit(store, batch).await?;
  tracing::info!(
    %run_id,
    tagged = summary.tagged,
    no_evidence = summary.no_evidence,
    skipped = summary.skipped,
    links = summary.commit.links_inserted,
    new_tags = summary.commit.tags_created,
    "product review tagging finished"
  );
  Ok(summary)
}

// ─── Guide and traveler reviews ──────────────────────────────────────────────

/// Extract character keywords from every unclassified guide and traveler
/// review and classify each against the rule corpus.
///
/// The corpus is only loaded once there is something to classify; an empty
/// corpus then aborts the run before any oracle call.
pub async fn tag_characters<S, O>(store: &S, oracle: &OracleAdapter<O>) -> Result<RunSummary>
where
  S: TaggingStore,
  O: ClassificationOracle,
{
  let run_id = Uuid::new_v4();
  let reviews = select_unclassified(store).await?;
  let mut summary = RunSummary::new(run_id, reviews.len());
  if reviews.is_empty() {
    tracing::info!(%run_id, "no guide or traveler reviews to classify");
    return Ok(summary);
  }

  let corpus = build_corpus(store).await?;
  let vocabulary = corpus.vocabulary();
  tracing::info!(%run_id, reviews = reviews.len(), "classifying reviews");

  let mut batch = EvidenceBatch::new(run_id, TagType::CharacterKeyword);

  for review in &reviews {
    let outcome = match classify_one(oracle, review, &vocabulary, &corpus).await {
      Ok((tags, category)) => {
        let outcome = if tags.is_empty() {
          ItemOutcome::NoEvidence
        } else if let Some(id) = category {
          ItemOutcome::Classified(id)
        } else {
          ItemOutcome::Unclassified
        };
        tracing::debug!(
          review_id = %review.review_id,
          kind = %review.kind,
          text = %review.excerpt(EXCERPT_CHARS),
          ?tags,
          ?outcome,
          "review processed"
        );
        batch.persist(review, tags, category);
        outcome
      }
      Err(e) => {
        skip(review, &e);
        ItemOutcome::Skipped
      }
    };
    summary.record(outcome);
  }

  summary.commit = commit(store, batch).await?;
  tracing::info!(
    %run_id,
    classified = summary.classified,
    unclassified = summary.unclassified,
    no_evidence = summary.no_evidence,
    skipped = summary.skipped,
    links = summary.commit.links_inserted,
    "character classification finished"
  );
  Ok(summary)
}

/// Extract, then classify if anything was extracted.
async fn classify_one<O: ClassificationOracle>(
  oracle: &OracleAdapter<O>,
  review: &ReviewableEntity,
  vocabulary: &Vocabulary,
  corpus: &RuleCorpus,
) -> Result<(Vec<String>, Option<CategoryId>), O::Error> {
  let tags = oracle.extract(&review.text, vocabulary).await?;
  if tags.is_empty() {
    return Ok((tags, None));
  }
  let category = oracle.classify(&tags, corpus).await?;
  Ok((tags, category))
}

fn skip(review: &ReviewableEntity, error: &dyn std::error::Error) {
  tracing::warn!(
    review_id = %review.review_id,
    kind = %review.kind,
    %error,
    "oracle call failed, leaving review for the next run"
  );
}
