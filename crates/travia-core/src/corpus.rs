//! The rule corpus handed to the classifier, and the vocabulary handed to
//! the extractor.
//!
//! Both are derived from the same bulk read of characters and their rule
//! tags, so the extractor can never produce a tag the classifier has not
//! been told about.

use std::{collections::BTreeSet, fmt::Write as _};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  character::{CategoryId, CharacterRules},
  tag::TagFilter,
};

// ─── Vocabulary ──────────────────────────────────────────────────────────────

/// Limits for open-vocabulary extraction over product reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPolicy {
  /// Keep at most this many tags per review.
  pub max_tags: usize,
  pub filter:   TagFilter,
}

impl Default for ExtractionPolicy {
  fn default() -> Self {
    let mut filter = TagFilter::default();
    filter.denylist.push("여행".to_owned());
    Self { max_tags: 3, filter }
  }
}

/// What the extractor is allowed to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vocabulary {
  /// Only these exact names.
  Closed(BTreeSet<String>),
  /// Anything that survives the cleaning heuristics.
  Open(ExtractionPolicy),
}

/// Characters the model wraps tags in that never belong to the tag itself.
const STRIP_CHARS: &[char] = &['(', ')', '\'', '"', ':', '[', ']'];

impl Vocabulary {
  /// Reduce untrusted oracle output to the tags this vocabulary admits.
  ///
  /// Order is preserved and duplicates collapse to their first occurrence.
  pub fn admit(&self, raw: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    match self {
      Self::Closed(allowed) => raw
        .into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| {
          let ok = allowed.contains(t);
          if !ok && !t.is_empty() {
            tracing::debug!(tag = %t, "discarding tag outside the allowed vocabulary");
          }
          ok
        })
        .filter(|t| seen.insert(t.clone()))
        .collect(),
      Self::Open(policy) => raw
        .into_iter()
        .map(|t| t.replace(STRIP_CHARS, "").trim().to_owned())
        .filter(|t| match policy.filter.rejection(t) {
          None => true,
          Some(reason) => {
            tracing::debug!(tag = %t, ?reason, "discarding tag");
            false
          }
        })
        .filter(|t| seen.insert(t.clone()))
        .take(policy.max_tags)
        .collect(),
    }
  }
}

// ─── Rule corpus ─────────────────────────────────────────────────────────────

/// The RAG context for the classifier: one block per character with its id,
/// description and defining tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCorpus {
  rules:      Vec<CharacterRules>,
  vocabulary: BTreeSet<String>,
  text:       String,
}

impl RuleCorpus {
  /// Build the corpus from every character and its rule tags.
  ///
  /// Fails with [`Error::CorpusEmpty`] when there are no characters; callers
  /// must treat that as fatal rather than classify nothing.
  pub fn build(rules: Vec<CharacterRules>) -> Result<Self> {
    if rules.is_empty() {
      return Err(Error::CorpusEmpty);
    }

    let vocabulary: BTreeSet<String> = rules
      .iter()
      .flat_map(|r| r.tags.iter().cloned())
      .collect();

    let mut text = String::new();
    for rule in &rules {
      let c = &rule.character;
      let tags = if rule.tags.is_empty() {
        "(none)".to_owned()
      } else {
        rule.tags.join(", ")
      };
      // Writing into a String cannot fail.
      let _ = writeln!(text, "[character {}] {}", c.character_id, c.name);
      let _ = writeln!(text, "- description: {}", c.description);
      let _ = writeln!(text, "- tags: {tags}");
      text.push('\n');
    }

    Ok(Self { rules, vocabulary, text })
  }

  /// The union of every rule tag name.
  pub fn allowed_vocabulary(&self) -> &BTreeSet<String> { &self.vocabulary }

  pub fn vocabulary(&self) -> Vocabulary { Vocabulary::Closed(self.vocabulary.clone()) }

  /// The structured text the classifier reads.
  pub fn text(&self) -> &str { &self.text }

  pub fn category_ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
    self.rules.iter().map(|r| r.character.character_id)
  }

  pub fn contains(&self, id: CategoryId) -> bool {
    self.category_ids().any(|c| c == id)
  }

  pub fn len(&self) -> usize { self.rules.len() }

  pub fn is_empty(&self) -> bool { self.rules.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::character::Character;

  fn rules(id: i64, name: &str, tags: &[&str]) -> CharacterRules {
    CharacterRules {
      character: Character {
        character_id: CategoryId(id),
        name:         name.into(),
        description:  format!("{name} 설명"),
        image_ref:    None,
      },
      tags: tags.iter().map(|t| (*t).to_owned()).collect(),
    }
  }

  #[test]
  fn empty_corpus_is_an_error() {
    assert!(matches!(RuleCorpus::build(Vec::new()), Err(Error::CorpusEmpty)));
  }

  #[test]
  fn vocabulary_is_the_union_of_rule_tags() {
    let corpus = RuleCorpus::build(vec![
      rules(1, "수다쟁이", &["TMI", "친절함"]),
      rules(2, "모험가", &["친절함", "도전적"]),
    ])
    .unwrap();

    let vocab: Vec<_> = corpus.allowed_vocabulary().iter().cloned().collect();
    assert_eq!(vocab, vec!["TMI", "도전적", "친절함"]);
    assert!(corpus.contains(CategoryId(2)));
    assert!(!corpus.contains(CategoryId(9)));
  }

  #[test]
  fn text_has_one_block_per_character() {
    let corpus = RuleCorpus::build(vec![
      rules(1, "수다쟁이", &["TMI", "친절함"]),
      rules(4, "은둔자", &[]),
    ])
    .unwrap();

    let text = corpus.text();
    assert!(text.contains("[character 1] 수다쟁이\n- description: 수다쟁이 설명\n- tags: TMI, 친절함\n"));
    assert!(text.contains("[character 4] 은둔자"));
    assert!(text.contains("- tags: (none)"));
  }

  #[test]
  fn closed_vocabulary_discards_unknown_tokens() {
    let vocab = Vocabulary::Closed(["친절함", "유머"].iter().map(|s| s.to_string()).collect());
    let admitted = vocab.admit(vec![
      " 친절함 ".into(),
      "지어낸태그".into(),
      "유머".into(),
      "친절함".into(),
    ]);
    assert_eq!(admitted, vec!["친절함", "유머"]);
  }

  #[test]
  fn open_vocabulary_cleans_and_caps() {
    let vocab = Vocabulary::Open(ExtractionPolicy::default());
    let admitted = vocab.admit(vec![
      "'제주도'".into(),
      "장소: 쇠소깍".into(),
      "-".into(),
      "(투명카약)".into(),
      "흑돼지".into(),
    ]);
    // "장소 쇠소깍" is denylisted and "-" is too short.
    assert_eq!(admitted, vec!["제주도", "투명카약", "흑돼지"]);

    let vocab = Vocabulary::Open(ExtractionPolicy { max_tags: 1, ..Default::default() });
    assert_eq!(vocab.admit(vec!["부산".into(), "해운대".into()]), vec!["부산"]);
  }
}
