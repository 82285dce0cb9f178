//! Prompt construction for the three oracle calls.

use travia_core::corpus::{RuleCorpus, Vocabulary};

/// A system/user message pair plus the sampling temperature it is meant for.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
  pub system:      String,
  pub user:        String,
  pub temperature: f32,
}

const CLOSED_EXTRACTION: &str = "\
You read a travel review and find the words that describe the person being \
reviewed. You are given an allowed tag list and the review text. Return only \
tags from the allowed list, spelled exactly as listed, that the review \
supports. Answer with a comma-separated list and nothing else. If no tag \
applies, answer with an empty string.";

const CLASSIFICATION: &str = "\
You assign a character to a person based on tags found in reviews about them. \
You are given a rule book with each character's id, description and defining \
tags, followed by the extracted tags. Use both the descriptions and the tags \
to choose the single best-matching character. Answer with that character's \
numeric id only, with no other text.";

fn open_extraction(max_tags: usize) -> String {
  format!(
    "You pick search tags from a domestic travel review. Return at most \
     {max_tags} concrete nouns: places (when a landmark is named, include its \
     city or island as well), specific activities such as surfing or hanbok \
     rental, and particular foods or objects. Never return verbs, adjectives, \
     moods, category labels or commentary. Answer with a comma-separated list \
     and nothing else. If nothing qualifies, answer with an empty string."
  )
}

/// Tag extraction for one review, closed or open depending on `vocabulary`.
pub fn extraction(text: &str, vocabulary: &Vocabulary) -> Prompt {
  match vocabulary {
    Vocabulary::Closed(allowed) => {
      let list: Vec<&str> = allowed.iter().map(String::as_str).collect();
      Prompt {
        system:      CLOSED_EXTRACTION.to_owned(),
        user:        format!("[allowed tags]\n{}\n\n[review]\n{text}", list.join(", ")),
        temperature: 0.0,
      }
    }
    Vocabulary::Open(policy) => Prompt {
      system:      open_extraction(policy.max_tags),
      user:        text.to_owned(),
      temperature: 0.2,
    },
  }
}

/// Classification of an extracted tag set against the rule corpus.
pub fn classification(tags: &[String], corpus: &RuleCorpus) -> Prompt {
  Prompt {
    system:      CLASSIFICATION.to_owned(),
    user:        format!("[rule book]\n{}\n[tags]\n{}", corpus.text(), tags.join(", ")),
    temperature: 0.1,
  }
}

#[cfg(test)]
mod tests {
  use travia_core::{
    character::{CategoryId, Character, CharacterRules},
    corpus::ExtractionPolicy,
  };

  use super::*;

  #[test]
  fn closed_extraction_lists_the_vocabulary() {
    let vocabulary = Vocabulary::Closed(["친절함".to_owned(), "TMI".to_owned()].into());
    let prompt = extraction("설명을 많이 해주셨어요", &vocabulary);

    assert!(prompt.user.starts_with("[allowed tags]\nTMI, 친절함\n"));
    assert!(prompt.user.ends_with("설명을 많이 해주셨어요"));
    assert_eq!(prompt.temperature, 0.0);
  }

  #[test]
  fn open_extraction_states_the_tag_limit() {
    let policy = ExtractionPolicy { max_tags: 2, ..Default::default() };
    let prompt = extraction("해운대 야경", &Vocabulary::Open(policy));

    assert!(prompt.system.contains("at most 2"));
    assert_eq!(prompt.user, "해운대 야경");
  }

  #[test]
  fn classification_embeds_the_corpus() {
    let corpus = RuleCorpus::build(vec![CharacterRules {
      character: Character {
        character_id: CategoryId(3),
        name:         "모험가".into(),
        description:  "새로운 것에 도전한다".into(),
        image_ref:    None,
      },
      tags:      vec!["도전적".into()],
    }])
    .unwrap();

    let prompt = classification(&["도전적".into(), "활발함".into()], &corpus);
    assert!(prompt.user.contains("[character 3] 모험가"));
    assert!(prompt.user.ends_with("[tags]\n도전적, 활발함"));
  }
}
