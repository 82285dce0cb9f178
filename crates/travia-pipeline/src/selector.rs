//! Choosing the reviews a run will work on.
//!
//! Selection has no side effects. A review drops out of the selection as soon
//! as a committed run has stamped it, which is what lets every job terminate.

use travia_core::{
  review::{ReviewKind, ReviewableEntity},
  store::TaggingStore,
};

use crate::{PipelineError, Result};

/// Guide and traveler reviews with no category and no processed stamp.
pub async fn select_unclassified<S: TaggingStore>(store: &S) -> Result<Vec<ReviewableEntity>> {
  let mut out = Vec::new();
  for kind in ReviewKind::CHARACTER {
    let reviews = store
      .unprocessed_reviews(kind)
      .await
      .map_err(PipelineError::unavailable)?;
    tracing::debug!(%kind, count = reviews.len(), "selected reviews");
    out.extend(reviews);
  }
  Ok(out)
}

/// Product reviews no tagging run has processed.
pub async fn select_untagged<S: TaggingStore>(store: &S) -> Result<Vec<ReviewableEntity>> {
  store
    .unprocessed_reviews(ReviewKind::Product)
    .await
    .map_err(PipelineError::unavailable)
}
