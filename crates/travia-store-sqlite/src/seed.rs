//! Admin-side writes that the pipeline itself never performs: curating the
//! character taxonomy, and the product/booking/review rows the rest of the
//! marketplace normally owns. Used by the `seed` command and by tests.

use std::collections::BTreeSet;

use chrono::Utc;
use travia_core::{
  character::CategoryId,
  evidence::Provenance,
  promotion::ProductId,
  review::{BookingId, ReviewId, ReviewKind, SubjectId},
  tag::{TagId, TagType},
};

use crate::{
  Error, Result, SqliteStore,
  encode::{encode_dt, encode_provenance, link_table, review_table},
  store::begin_write,
  vocabulary::resolve_tags,
};

/// A character definition as curated by an administrator.
#[derive(Debug, Clone)]
pub struct NewCharacter {
  pub name:        String,
  pub description: String,
  pub image_ref:   Option<String>,
  /// Names of the rule tags; created as `curated` if missing.
  pub tags:        Vec<String>,
}

impl SqliteStore {
  /// Insert or refresh a character and attach its rule tags.
  ///
  /// Idempotent by character name: re-seeding updates the description and
  /// image, and adds any rule tags not already linked.
  pub async fn upsert_character(&self, input: NewCharacter) -> Result<CategoryId> {
    let id = self
      .conn
      .call(move |conn| {
        let mut tx = begin_write(conn)?;
        let id: i64 = tx.query_row(
          "INSERT INTO characters (name, description, image_ref) VALUES (?1, ?2, ?3)
           ON CONFLICT (name) DO UPDATE
             SET description = excluded.description,
                 image_ref   = excluded.image_ref
           RETURNING character_id",
          rusqlite::params![input.name, input.description, input.image_ref],
          |r| r.get(0),
        )?;

        let names: BTreeSet<String> = input
          .tags
          .iter()
          .map(|t| t.trim().to_owned())
          .filter(|t| !t.is_empty())
          .collect();
        let (tag_ids, _) = resolve_tags(&mut tx, &names, TagType::Curated)?;
        for tag_id in tag_ids.values() {
          tx.execute(
            "INSERT OR IGNORE INTO character_rules (character_id, tag_id) VALUES (?1, ?2)",
            rusqlite::params![id, tag_id.0],
          )?;
        }

        tx.commit()?;
        Ok(id)
      })
      .await?;

    Ok(CategoryId(id))
  }

  pub async fn add_product(&self, title: &str) -> Result<ProductId> {
    let title = title.to_owned();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute("INSERT INTO products (title) VALUES (?1)", rusqlite::params![title])?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(ProductId(id))
  }

  pub async fn add_booking(&self, product_id: ProductId) -> Result<BookingId> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO bookings (product_id) VALUES (?1)",
          rusqlite::params![product_id.0],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(BookingId(id))
  }

  /// Record a traveler's review of the product behind `booking_id`.
  pub async fn add_product_review(&self, booking_id: BookingId, text: &str) -> Result<ReviewId> {
    let text = text.to_owned();
    let at = encode_dt(Utc::now());
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO product_reviews (booking_id, text, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![booking_id.0, text, at],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(ReviewId(id))
  }

  /// Record a guide or traveler review about `subject_id`.
  pub async fn add_character_review(
    &self,
    kind: ReviewKind,
    booking_id: BookingId,
    subject_id: SubjectId,
    text: &str,
  ) -> Result<ReviewId> {
    if !kind.is_classifiable() {
      return Err(Error::NotClassifiable { kind });
    }
    let sql = format!(
      "INSERT INTO {} (booking_id, subject_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
      review_table(kind)
    );
    let text = text.to_owned();
    let at = encode_dt(Utc::now());
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![booking_id.0, subject_id.0, text, at])?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(ReviewId(id))
  }

  /// Attach a manually curated tag to a review. Manual links are kept apart
  /// from AI evidence and never counted by promotion.
  pub async fn add_manual_evidence(
    &self,
    kind: ReviewKind,
    review_id: ReviewId,
    tag_id: TagId,
  ) -> Result<()> {
    let sql = format!(
      "INSERT OR IGNORE INTO {} (review_id, tag_id, source, run_id, recorded_at)
       VALUES (?1, ?2, ?3, NULL, ?4)",
      link_table(kind)
    );
    let source = encode_provenance(Provenance::Manual);
    let at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params![review_id.0, tag_id.0, source, at])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Pin a tag on a product by hand. Promotion runs never remove these.
  pub async fn add_manual_promoted_tag(&self, product_id: ProductId, tag_id: TagId) -> Result<()> {
    let source = encode_provenance(Provenance::Manual);
    let at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO product_tags (product_id, tag_id, source, promoted_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![product_id.0, tag_id.0, source, at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
