//! The promotion job.

use travia_core::{
  promotion::{self, PromotionPolicy},
  store::{ReplaceSummary, TaggingStore},
};

use crate::{PipelineError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionSummary {
  /// Products with any AI evidence.
  pub products: usize,
  pub promoted: usize,
  /// Aggregates the tag filter dropped.
  pub rejected: usize,
  pub replaced: ReplaceSummary,
}

/// Recompute every product's AI-promoted tags from the evidence.
///
/// The previous AI set is always replaced, even by an empty one: a product
/// whose evidence is entirely filtered out ends with no promoted tags.
/// Manually promoted tags are untouched.
pub async fn promote_tags<S: TaggingStore>(
  store: &S,
  policy: &PromotionPolicy,
) -> Result<PromotionSummary> {
  let counts = store
    .product_tag_counts()
    .await
    .map_err(PipelineError::unavailable)?;
  let aggregates = counts.len();
  let plan = promotion::plan(counts, policy)?;
  tracing::info!(
    products = plan.products,
    aggregates,
    rejected = plan.rejected,
    promoted = plan.promoted.len(),
    top_k = policy.top_k,
    "promotion planned"
  );

  let summary = PromotionSummary {
    products: plan.products,
    promoted: plan.promoted.len(),
    rejected: plan.rejected,
    replaced: store
      .replace_promoted_tags(plan.promoted)
      .await
      .map_err(PipelineError::commit)?,
  };
  tracing::info!(
    deleted = summary.replaced.deleted,
    inserted = summary.replaced.inserted,
    "promoted tags replaced"
  );
  Ok(summary)
}
