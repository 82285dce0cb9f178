//! The `seed` command: load the character taxonomy from a TOML file.
//!
//! ```toml
//! [[character]]
//! name = "수다쟁이"
//! description = "말이 많고 정보를 아낌없이 나눈다"
//! image_ref = "/static/characters/talker.png"
//! tags = ["TMI", "친절함", "유머"]
//! ```

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use travia_store_sqlite::{NewCharacter, SqliteStore};

#[derive(Debug, Deserialize)]
pub struct SeedFile {
  #[serde(default, rename = "character")]
  pub characters: Vec<SeedCharacter>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCharacter {
  pub name:        String,
  pub description: String,
  #[serde(default)]
  pub image_ref:   Option<String>,
  #[serde(default)]
  pub tags:        Vec<String>,
}

impl From<SeedCharacter> for NewCharacter {
  fn from(c: SeedCharacter) -> Self {
    Self {
      name:        c.name,
      description: c.description,
      image_ref:   c.image_ref,
      tags:        c.tags,
    }
  }
}

impl SeedFile {
  pub fn read(path: &Path) -> anyhow::Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading seed file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))
  }

  /// Upsert every character; returns how many were written.
  pub async fn apply(self, store: &SqliteStore) -> anyhow::Result<usize> {
    let count = self.characters.len();
    for character in self.characters {
      let name = character.name.clone();
      let id = store
        .upsert_character(character.into())
        .await
        .with_context(|| format!("seeding character {name:?}"))?;
      tracing::info!(character_id = %id, %name, "character seeded");
    }
    Ok(count)
  }
}

#[cfg(test)]
mod tests {
  use travia_core::store::TaggingStore;

  use super::*;

  const SAMPLE: &str = r#"
    [[character]]
    name = "수다쟁이"
    description = "말이 많다"
    tags = ["TMI", "친절함"]

    [[character]]
    name = "은둔자"
    description = "조용하다"
  "#;

  #[tokio::test]
  async fn seeding_twice_is_idempotent() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    for _ in 0..2 {
      let file: SeedFile = toml::from_str(SAMPLE).unwrap();
      assert_eq!(file.apply(&store).await.unwrap(), 2);
    }

    let rules = store.load_character_rules().await.unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].tags, vec!["TMI", "친절함"]);
    assert!(rules[1].tags.is_empty());
  }
}
