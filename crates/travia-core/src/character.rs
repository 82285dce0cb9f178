//! Characters — the fixed, admin-curated archetype taxonomy.
//!
//! The pipeline never creates or edits characters; it only reads them
//! together with their rule tags to build the classifier's rule corpus.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
  pub character_id: CategoryId,
  pub name:         String,
  pub description:  String,
  pub image_ref:    Option<String>,
}

/// A character bundled with the names of its defining rule tags.
///
/// This is one row of the RAG knowledge base: the tags are the evidence a
/// review must show for the classifier to pick this character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRules {
  pub character: Character,
  pub tags:      Vec<String>,
}
