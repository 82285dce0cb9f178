//! Profile roll-up: the representative character of each reviewed person.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  character::CategoryId,
  review::{ReviewKind, SubjectId},
};

/// Which side of a booking a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
  Guide,
  Traveler,
}

impl ProfileRole {
  /// The review kind that carries evidence of this role's character.
  pub fn review_kind(self) -> ReviewKind {
    match self {
      Self::Guide => ReviewKind::Guide,
      Self::Traveler => ReviewKind::Traveler,
    }
  }
}

/// How many classified reviews put `subject_id` in `character_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterTally {
  pub subject_id:   SubjectId,
  pub character_id: CategoryId,
  pub reviews:      u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCharacter {
  pub subject_id:   SubjectId,
  pub role:         ProfileRole,
  pub character_id: CategoryId,
}

/// Pick the most frequent character per subject; ties go to the lowest
/// character id.
pub fn representatives(role: ProfileRole, tallies: &[CharacterTally]) -> Vec<ProfileCharacter> {
  let mut best: BTreeMap<SubjectId, (u64, CategoryId)> = BTreeMap::new();
  for t in tallies {
    best
      .entry(t.subject_id)
      .and_modify(|(reviews, id)| {
        if t.reviews > *reviews || (t.reviews == *reviews && t.character_id < *id) {
          *reviews = t.reviews;
          *id = t.character_id;
        }
      })
      .or_insert((t.reviews, t.character_id));
  }

  best
    .into_iter()
    .map(|(subject_id, (_, character_id))| ProfileCharacter { subject_id, role, character_id })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tally(subject: i64, character: i64, reviews: u64) -> CharacterTally {
    CharacterTally {
      subject_id: SubjectId(subject),
      character_id: CategoryId(character),
      reviews,
    }
  }

  #[test]
  fn most_frequent_wins_and_ties_go_low() {
    let picked = representatives(
      ProfileRole::Guide,
      &[tally(1, 2, 3), tally(1, 5, 4), tally(2, 7, 2), tally(2, 3, 2)],
    );
    assert_eq!(
      picked,
      vec![
        ProfileCharacter {
          subject_id:   SubjectId(1),
          role:         ProfileRole::Guide,
          character_id: CategoryId(5),
        },
        ProfileCharacter {
          subject_id:   SubjectId(2),
          role:         ProfileRole::Guide,
          character_id: CategoryId(3),
        },
      ]
    );
  }

  #[test]
  fn roles_map_to_classifiable_review_kinds() {
    for role in [ProfileRole::Guide, ProfileRole::Traveler] {
      assert!(role.review_kind().is_classifiable());
    }
    assert_eq!(ProfileRole::Traveler.review_kind(), ReviewKind::Traveler);
  }
}
