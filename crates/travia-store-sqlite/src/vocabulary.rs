//! Tag get-or-create with race tolerance.
//!
//! Callers hold an immediate write transaction, so the bulk lookup already
//! sees every committed tag. Each missing name is then inserted inside its
//! own savepoint. If another writer created the same name in the meantime,
//! the UNIQUE constraint fires, only that savepoint is rolled back, and the
//! winner's row is re-read. The surrounding transaction keeps going.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{OptionalExtension as _, Transaction};
use travia_core::tag::{Tag, TagId, TagType};

use crate::{
  Result, SqliteStore,
  encode::{decode_tag_type, encode_tag_type},
};

/// SQLite's default host-parameter limit is far above this; keeping batches
/// small keeps the prepared statements cacheable.
const LOOKUP_CHUNK: usize = 200;

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Look up every name in `names`, returning the ones that exist.
pub(crate) fn lookup_tags(
  conn: &rusqlite::Connection,
  names: &BTreeSet<String>,
) -> rusqlite::Result<BTreeMap<String, TagId>> {
  let names: Vec<&String> = names.iter().collect();
  let mut found = BTreeMap::new();

  for chunk in names.chunks(LOOKUP_CHUNK) {
    let placeholders = vec!["?"; chunk.len()].join(", ");
    let mut stmt = conn.prepare_cached(&format!(
      "SELECT name, tag_id FROM tags WHERE name IN ({placeholders})"
    ))?;
    let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
      Ok((row.get::<_, String>(0)?, TagId(row.get(1)?)))
    })?;
    for row in rows {
      let (name, id) = row?;
      found.insert(name, id);
    }
  }

  Ok(found)
}

/// Insert `name`, or fetch it if a concurrent writer got there first.
///
/// Returns the tag id and whether this call created the row.
pub(crate) fn insert_or_fetch_tag(
  tx: &mut Transaction<'_>,
  name: &str,
  tag_type: TagType,
) -> rusqlite::Result<(TagId, bool)> {
  let mut sp = tx.savepoint()?;
  match sp.execute(
    "INSERT INTO tags (name, tag_type) VALUES (?1, ?2)",
    rusqlite::params![name, encode_tag_type(tag_type)],
  ) {
    Ok(_) => {
      let id = TagId(sp.last_insert_rowid());
      sp.commit()?;
      Ok((id, true))
    }
    Err(e) if is_unique_violation(&e) => {
      tracing::debug!(tag = %name, "tag created concurrently, re-reading");
      sp.rollback()?;
      drop(sp);
      let id = tx.query_row(
        "SELECT tag_id FROM tags WHERE name = ?1",
        rusqlite::params![name],
        |r| r.get(0),
      )?;
      Ok((TagId(id), false))
    }
    Err(e) => Err(e),
  }
}

/// Resolve every name to an id inside `tx`, creating what is missing.
///
/// Returns the full map and the number of tags created.
pub(crate) fn resolve_tags(
  tx: &mut Transaction<'_>,
  names: &BTreeSet<String>,
  tag_type: TagType,
) -> rusqlite::Result<(BTreeMap<String, TagId>, usize)> {
  let mut ids = lookup_tags(tx, names)?;
  let mut created = 0;

  for name in names {
    if ids.contains_key(name) {
      continue;
    }
    let (id, fresh) = insert_or_fetch_tag(tx, name, tag_type)?;
    if fresh {
      created += 1;
    }
    ids.insert(name.clone(), id);
  }

  Ok((ids, created))
}

impl SqliteStore {
  /// Fetch a single tag by exact name.
  pub async fn get_tag(&self, name: &str) -> Result<Option<Tag>> {
    let name = name.to_owned();
    let raw: Option<(i64, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT tag_id, name, tag_type FROM tags WHERE name = ?1",
            rusqlite::params![name],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(id, name, tag_type)| {
        Ok(Tag { tag_id: TagId(id), name, tag_type: decode_tag_type(&tag_type)? })
      })
      .transpose()
  }
}
