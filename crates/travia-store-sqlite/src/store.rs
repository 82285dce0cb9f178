//! [`SqliteStore`] — the SQLite implementation of [`TaggingStore`].

use std::{
  collections::{BTreeMap, BTreeSet},
  path::Path,
  time::Duration,
};

use chrono::Utc;
use travia_core::{
  character::{CategoryId, Character, CharacterRules},
  evidence::{CommitSummary, EvidenceBatch, EvidenceRecord, Provenance},
  profile::{CharacterTally, ProfileCharacter, ProfileRole},
  promotion::{ProductId, PromotedTag, TagCount},
  review::{ReviewKind, ReviewableEntity, SubjectId},
  store::{PromotedTagRecord, ReplaceSummary, TaggingStore},
  tag::{TagId, TagType},
};

use crate::{
  Error, Result,
  encode::{
    RawEvidence, RawPromoted, RawReview, decode_role, encode_dt, encode_provenance,
    encode_role, encode_uuid, link_table, review_table,
  },
  schema::SCHEMA,
  vocabulary::resolve_tags,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A tagging store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Begin a transaction that takes the write lock up front.
///
/// A deferred transaction that reads before writing pins a WAL snapshot, and
/// a commit from another connection in between turns its first write into
/// `SQLITE_BUSY_SNAPSHOT`. Reads inside an immediate transaction always see
/// the latest committed rows; waiting for the lock is left to the busy
/// timeout.
pub(crate) fn begin_write(
  conn: &mut rusqlite::Connection,
) -> rusqlite::Result<rusqlite::Transaction<'_>> {
  conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
}

/// Mark one review processed, guarded so a review is only ever stamped once.
///
/// Returns `false` if the review was already processed (or does not exist).
fn stamp_review(
  tx: &rusqlite::Transaction<'_>,
  kind: ReviewKind,
  review_id: i64,
  category_id: Option<i64>,
  at: &str,
) -> rusqlite::Result<bool> {
  let table = review_table(kind);
  let changed = if kind.is_classifiable() {
    tx.execute(
      &format!(
        "UPDATE {table} SET character_id = ?1, processed_at = ?2
         WHERE review_id = ?3 AND character_id IS NULL AND processed_at IS NULL"
      ),
      rusqlite::params![category_id, at, review_id],
    )?
  } else {
    tx.execute(
      &format!(
        "UPDATE {table} SET processed_at = ?1
         WHERE review_id = ?2 AND processed_at IS NULL"
      ),
      rusqlite::params![at, review_id],
    )?
  };
  Ok(changed == 1)
}

// ─── TaggingStore impl ───────────────────────────────────────────────────────

impl TaggingStore for SqliteStore {
  type Error = Error;

  // ── Selection ─────────────────────────────────────────────────────────────

  async fn unprocessed_reviews(&self, kind: ReviewKind) -> Result<Vec<ReviewableEntity>> {
    let table = review_table(kind);
    let sql = if kind.is_classifiable() {
      format!(
        "SELECT review_id, text, character_id, processed_at, created_at
         FROM {table}
         WHERE character_id IS NULL AND processed_at IS NULL
         ORDER BY created_at, review_id"
      )
    } else {
      format!(
        "SELECT review_id, text, NULL, processed_at, created_at
         FROM {table}
         WHERE processed_at IS NULL
         ORDER BY created_at, review_id"
      )
    };

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawReview {
              review_id:    row.get(0)?,
              text:         row.get(1)?,
              category_id:  row.get(2)?,
              processed_at: row.get(3)?,
              created_at:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|r| r.into_entity(kind)).collect()
  }

  // ── Reference data ────────────────────────────────────────────────────────

  async fn load_character_rules(&self) -> Result<Vec<CharacterRules>> {
    // One LEFT JOIN instead of a query per character; characters with no
    // rule tags still appear, with a NULL tag name.
    type Row = (i64, String, String, Option<String>, Option<String>);
    let rows: Vec<Row> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT c.character_id, c.name, c.description, c.image_ref, t.name
           FROM characters c
           LEFT JOIN character_rules cr ON cr.character_id = c.character_id
           LEFT JOIN tags t             ON t.tag_id        = cr.tag_id
           ORDER BY c.character_id, t.name",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut out: Vec<CharacterRules> = Vec::new();
    for (id, name, description, image_ref, tag) in rows {
      let id = CategoryId(id);
      if out.last().is_none_or(|r| r.character.character_id != id) {
        out.push(CharacterRules {
          character: Character { character_id: id, name, description, image_ref },
          tags:      Vec::new(),
        });
      }
      if let (Some(tag), Some(current)) = (tag, out.last_mut()) {
        current.tags.push(tag);
      }
    }
    Ok(out)
  }

  async fn get_or_create_tags(
    &self,
    names: Vec<String>,
    tag_type: TagType,
  ) -> Result<BTreeMap<String, TagId>> {
    let names: BTreeSet<String> = names
      .into_iter()
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty())
      .collect();

    let (ids, created) = self
      .conn
      .call(move |conn| {
        let mut tx = begin_write(conn)?;
        let resolved = resolve_tags(&mut tx, &names, tag_type)?;
        tx.commit()?;
        Ok(resolved)
      })
      .await?;

    if created > 0 {
      tracing::debug!(created, "created new tags");
    }
    Ok(ids)
  }

  // ── Evidence ──────────────────────────────────────────────────────────────

  async fn commit_evidence(&self, batch: EvidenceBatch) -> Result<CommitSummary> {
    let run_id = encode_uuid(batch.run_id());
    let at = encode_dt(Utc::now());
    let source = encode_provenance(Provenance::Ai);

    let summary = self
      .conn
      .call(move |conn| {
        let mut tx = begin_write(conn)?;
        let names = batch.tag_names();
        let (ids, tags_created) = resolve_tags(&mut tx, &names, batch.tag_type())?;

        let mut summary = CommitSummary { tags_created, ..Default::default() };
        for item in batch.items() {
          let review_id = item.review_id.0;
          let category = item.category_id.map(|c| c.0);
          if !stamp_review(&tx, item.kind, review_id, category, &at)? {
            summary.skipped_stale += 1;
            continue;
          }
          summary.reviews_stamped += 1;

          let sql = format!(
            "INSERT OR IGNORE INTO {} (review_id, tag_id, source, run_id, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            link_table(item.kind)
          );
          let mut stmt = tx.prepare_cached(&sql)?;
          for name in &item.tags {
            if let Some(tag_id) = ids.get(name) {
              summary.links_inserted +=
                stmt.execute(rusqlite::params![review_id, tag_id.0, source, run_id, at])?;
            }
          }
        }

        tx.commit()?;
        Ok(summary)
      })
      .await?;

    Ok(summary)
  }

  async fn list_evidence(&self, kind: ReviewKind) -> Result<Vec<EvidenceRecord>> {
    let sql = format!(
      "SELECT l.review_id, l.tag_id, t.name, l.source, l.run_id, l.recorded_at
       FROM {} l
       JOIN tags t ON t.tag_id = l.tag_id
       ORDER BY l.review_id, l.tag_id",
      link_table(kind)
    );

    let raws: Vec<RawEvidence> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawEvidence {
              review_id:   row.get(0)?,
              tag_id:      row.get(1)?,
              tag_name:    row.get(2)?,
              source:      row.get(3)?,
              run_id:      row.get(4)?,
              recorded_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|r| r.into_record(kind)).collect()
  }

  // ── Promotion ─────────────────────────────────────────────────────────────

  async fn product_tag_counts(&self) -> Result<Vec<TagCount>> {
    let source = encode_provenance(Provenance::Ai);

    let rows: Vec<(i64, i64, String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.product_id, t.tag_id, t.name, COUNT(*) AS mentions
           FROM product_review_tags rt
           JOIN product_reviews r ON r.review_id  = rt.review_id
           JOIN bookings b        ON b.booking_id = r.booking_id
           JOIN tags t            ON t.tag_id     = rt.tag_id
           WHERE rt.source = ?1
           GROUP BY b.product_id, t.tag_id, t.name
           ORDER BY b.product_id, mentions DESC, t.tag_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![source], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(product_id, tag_id, name, mentions)| TagCount {
          product_id: ProductId(product_id),
          tag_id:     TagId(tag_id),
          name,
          mentions:   mentions.max(0) as u64,
        })
        .collect(),
    )
  }

  async fn replace_promoted_tags(&self, promoted: Vec<PromotedTag>) -> Result<ReplaceSummary> {
    let source = encode_provenance(Provenance::Ai);
    let at = encode_dt(Utc::now());

    let summary = self
      .conn
      .call(move |conn| {
        let tx = begin_write(conn)?;
        let deleted = tx.execute(
          "DELETE FROM product_tags WHERE source = ?1",
          rusqlite::params![source],
        )?;

        let mut inserted = 0;
        {
          let mut stmt = tx.prepare_cached(
            "INSERT INTO product_tags (product_id, tag_id, source, promoted_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for p in &promoted {
            inserted += stmt.execute(rusqlite::params![p.product_id.0, p.tag_id.0, source, at])?;
          }
        }

        tx.commit()?;
        Ok(ReplaceSummary { deleted, inserted })
      })
      .await?;

    Ok(summary)
  }

  async fn list_promoted_tags(
    &self,
    product_id: Option<ProductId>,
  ) -> Result<Vec<PromotedTagRecord>> {
    let product_id = product_id.map(|p| p.0);

    let raws: Vec<RawPromoted> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT pt.product_id, pt.tag_id, t.name, pt.source
           FROM product_tags pt
           JOIN tags t ON t.tag_id = pt.tag_id
           WHERE ?1 IS NULL OR pt.product_id = ?1
           ORDER BY pt.product_id, pt.promoted_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![product_id], |row| {
            Ok(RawPromoted {
              product_id: row.get(0)?,
              tag_id:     row.get(1)?,
              name:       row.get(2)?,
              source:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPromoted::into_record).collect()
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn character_tallies(&self, kind: ReviewKind) -> Result<Vec<CharacterTally>> {
    if !kind.is_classifiable() {
      return Err(Error::NotClassifiable { kind });
    }
    let sql = format!(
      "SELECT subject_id, character_id, COUNT(*)
       FROM {}
       WHERE character_id IS NOT NULL
       GROUP BY subject_id, character_id
       ORDER BY subject_id, character_id",
      review_table(kind)
    );

    let rows: Vec<(i64, i64, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(subject, character, reviews)| CharacterTally {
          subject_id:   SubjectId(subject),
          character_id: CategoryId(character),
          reviews:      reviews.max(0) as u64,
        })
        .collect(),
    )
  }

  async fn upsert_profile_characters(&self, profiles: Vec<ProfileCharacter>) -> Result<usize> {
    let at = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        let tx = begin_write(conn)?;
        let mut changed = 0;
        {
          let mut stmt = tx.prepare_cached(
            "INSERT INTO profile_characters (subject_id, role, character_id, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (subject_id, role) DO UPDATE
               SET character_id = excluded.character_id,
                   updated_at   = excluded.updated_at
               WHERE profile_characters.character_id != excluded.character_id",
          )?;
          for p in &profiles {
            changed += stmt.execute(rusqlite::params![
              p.subject_id.0,
              encode_role(p.role),
              p.character_id.0,
              at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    Ok(changed)
  }

  async fn list_profile_characters(&self, role: ProfileRole) -> Result<Vec<ProfileCharacter>> {
    let role_str = encode_role(role);

    let rows: Vec<(i64, String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, role, character_id
           FROM profile_characters
           WHERE role = ?1
           ORDER BY subject_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(subject, role, character)| {
        Ok(ProfileCharacter {
          subject_id:   SubjectId(subject),
          role:         decode_role(&role)?,
          character_id: CategoryId(character),
        })
      })
      .collect()
  }
}
