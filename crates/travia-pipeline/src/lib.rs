//! The batch jobs of the Travia review-tagging pipeline.
//!
//! Each job is generic over a [`TaggingStore`](travia_core::store::TaggingStore)
//! and, where it calls out, a
//! [`ClassificationOracle`](travia_core::oracle::ClassificationOracle). Jobs
//! run sequentially, stage every write in memory and commit once.

mod corpus;
mod error;
mod extract;
mod profiles;
mod promote;
mod selector;

pub use corpus::build_corpus;
pub use error::{PipelineError, Result};
pub use extract::{ItemOutcome, RunSummary, tag_characters, tag_reviews};
pub use profiles::{ProfileSummary, update_profiles};
pub use promote::{PromotionSummary, promote_tags};
pub use selector::{select_unclassified, select_untagged};
