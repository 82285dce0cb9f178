//! The classification oracle boundary.
//!
//! [`ClassificationOracle`] is the raw, untrusted capability: a model behind
//! a network call. [`OracleAdapter`] wraps it and enforces the two output
//! guarantees the rest of the pipeline relies on: extracted tags are always
//! admitted by the vocabulary, and a classification always names a category
//! that exists in the corpus.

use std::future::Future;

use crate::{
  character::CategoryId,
  corpus::{RuleCorpus, Vocabulary},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A non-deterministic, fallible text classifier.
///
/// Implementations may retry internally; an `Err` means the call for this
/// one review failed and the review should be retried on a later run.
pub trait ClassificationOracle: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the tags present in `text`. The output is not trusted to respect
  /// `vocabulary`.
  fn extract<'a>(
    &'a self,
    text: &'a str,
    vocabulary: &'a Vocabulary,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Pick one character id for `tags` using the rule corpus, or `None` if
  /// the model gave no usable answer. The id is not trusted to exist.
  fn classify<'a>(
    &'a self,
    tags: &'a [String],
    corpus: &'a RuleCorpus,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + 'a;
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// Owns an injected oracle and post-filters everything it returns.
pub struct OracleAdapter<O> {
  oracle: O,
}

impl<O: ClassificationOracle> OracleAdapter<O> {
  pub fn new(oracle: O) -> Self { Self { oracle } }

  pub fn inner(&self) -> &O { &self.oracle }

  /// Extract tags, keeping only those `vocabulary` admits.
  ///
  /// Empty text or an empty closed vocabulary short-circuits to no tags
  /// without calling the oracle.
  pub async fn extract(
    &self,
    text: &str,
    vocabulary: &Vocabulary,
  ) -> Result<Vec<String>, O::Error> {
    if text.trim().is_empty() {
      return Ok(Vec::new());
    }
    if let Vocabulary::Closed(allowed) = vocabulary
      && allowed.is_empty()
    {
      return Ok(Vec::new());
    }

    let raw = self.oracle.extract(text, vocabulary).await?;
    let raw_len = raw.len();
    let admitted = vocabulary.admit(raw);
    if admitted.len() < raw_len {
      tracing::debug!(
        returned = raw_len,
        admitted = admitted.len(),
        "oracle returned tags outside the vocabulary"
      );
    }
    Ok(admitted)
  }

  /// Classify `tags`; an id the corpus does not know becomes `None`.
  pub async fn classify(
    &self,
    tags: &[String],
    corpus: &RuleCorpus,
  ) -> Result<Option<CategoryId>, O::Error> {
    if tags.is_empty() {
      return Ok(None);
    }

    let raw = self.oracle.classify(tags, corpus).await?;
    Ok(raw.map(CategoryId).filter(|id| {
      let known = corpus.contains(*id);
      if !known {
        tracing::warn!(category_id = %id, "oracle returned an unknown category id");
      }
      known
    }))
  }
}

#[cfg(test)]
mod tests {
  use std::{
    convert::Infallible,
    sync::atomic::{AtomicUsize, Ordering},
  };

  use super::*;
  use crate::character::{Character, CharacterRules};

  /// Returns the same canned answer for every call.
  struct Canned {
    tags:     Vec<String>,
    category: Option<i64>,
    calls:    AtomicUsize,
  }

  impl ClassificationOracle for Canned {
    type Error = Infallible;

    async fn extract(&self, _: &str, _: &Vocabulary) -> Result<Vec<String>, Infallible> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(self.tags.clone())
    }

    async fn classify(&self, _: &[String], _: &RuleCorpus) -> Result<Option<i64>, Infallible> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(self.category)
    }
  }

  fn canned(tags: &[&str], category: Option<i64>) -> OracleAdapter<Canned> {
    OracleAdapter::new(Canned {
      tags: tags.iter().map(|t| (*t).to_owned()).collect(),
      category,
      calls: AtomicUsize::new(0),
    })
  }

  fn corpus() -> RuleCorpus {
    RuleCorpus::build(vec![CharacterRules {
      character: Character {
        character_id: CategoryId(1),
        name:         "수다쟁이".into(),
        description:  "말이 많고 정보를 아낌없이 나눈다".into(),
        image_ref:    None,
      },
      tags:      vec!["TMI".into(), "친절함".into()],
    }])
    .unwrap()
  }

  #[tokio::test]
  async fn extract_enforces_containment() {
    let adapter = canned(&["TMI", "환각태그", "친절함"], None);
    let tags = adapter.extract("말이 정말 많으셨어요", &corpus().vocabulary()).await.unwrap();
    assert_eq!(tags, vec!["TMI", "친절함"]);
  }

  #[tokio::test]
  async fn unknown_category_becomes_none() {
    let corpus = corpus();
    let tags = vec!["TMI".to_owned()];

    let adapter = canned(&[], Some(42));
    assert_eq!(adapter.classify(&tags, &corpus).await.unwrap(), None);

    let adapter = canned(&[], Some(1));
    assert_eq!(adapter.classify(&tags, &corpus).await.unwrap(), Some(CategoryId(1)));
  }

  #[tokio::test]
  async fn trivial_inputs_skip_the_oracle() {
    let adapter = canned(&["TMI"], Some(1));
    let corpus = corpus();

    assert!(adapter.extract("   ", &corpus.vocabulary()).await.unwrap().is_empty());
    assert!(adapter.classify(&[], &corpus).await.unwrap().is_none());
    let empty = Vocabulary::Closed(Default::default());
    assert!(adapter.extract("본문", &empty).await.unwrap().is_empty());

    assert_eq!(adapter.inner().calls.load(Ordering::SeqCst), 0);
  }
}
