use travia_core::{corpus::RuleCorpus, store::TaggingStore};

use crate::{PipelineError, Result};

/// Load every character with its rule tags and build the classifier corpus.
///
/// An empty taxonomy is [`PipelineError::CorpusEmpty`], which callers treat
/// as fatal.
pub async fn build_corpus<S: TaggingStore>(store: &S) -> Result<RuleCorpus> {
  let rules = store
    .load_character_rules()
    .await
    .map_err(PipelineError::unavailable)?;
  let corpus = RuleCorpus::build(rules)?;
  tracing::info!(
    characters = corpus.len(),
    vocabulary = corpus.allowed_vocabulary().len(),
    "rule corpus loaded"
  );
  Ok(corpus)
}
