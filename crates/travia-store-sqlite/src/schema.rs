//! SQL schema for the Travia SQLite store.
//!
//! Executed once at connection startup. Only the tables the tagging pipeline
//! reads or writes are defined here; users, payments and the rest of the
//! marketplace live elsewhere, so `subject_id` carries no foreign key.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Shared controlled vocabulary. Rows are never updated.
CREATE TABLE IF NOT EXISTS tags (
    tag_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name      TEXT NOT NULL UNIQUE,
    tag_type  TEXT NOT NULL    -- 'curated' | 'ai_extracted' | 'character_keyword'
);

-- Admin-curated taxonomy; read-only to the pipeline.
CREATE TABLE IF NOT EXISTS characters (
    character_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE,
    description  TEXT NOT NULL,
    image_ref    TEXT
);

CREATE TABLE IF NOT EXISTS character_rules (
    character_id INTEGER NOT NULL REFERENCES characters(character_id) ON DELETE CASCADE,
    tag_id       INTEGER NOT NULL REFERENCES tags(tag_id),
    PRIMARY KEY (character_id, tag_id)
);

CREATE TABLE IF NOT EXISTS products (
    product_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bookings (
    booking_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL REFERENCES products(product_id)
);

-- processed_at is the only 'done' marker; it is set even when a run found
-- no evidence, so such reviews are never selected again.
CREATE TABLE IF NOT EXISTS product_reviews (
    review_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    booking_id   INTEGER NOT NULL UNIQUE REFERENCES bookings(booking_id),
    text         TEXT NOT NULL,
    processed_at TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS guide_reviews (
    review_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    booking_id   INTEGER NOT NULL UNIQUE REFERENCES bookings(booking_id),
    subject_id   INTEGER NOT NULL,  -- the guide
    text         TEXT NOT NULL,
    character_id INTEGER REFERENCES characters(character_id),
    processed_at TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS traveler_reviews (
    review_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    booking_id   INTEGER NOT NULL UNIQUE REFERENCES bookings(booking_id),
    subject_id   INTEGER NOT NULL,  -- the traveler
    text         TEXT NOT NULL,
    character_id INTEGER REFERENCES characters(character_id),
    processed_at TEXT,
    created_at   TEXT NOT NULL
);

-- Evidence links, one table per review kind. Append-only.
CREATE TABLE IF NOT EXISTS product_review_tags (
    link_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    review_id   INTEGER NOT NULL REFERENCES product_reviews(review_id) ON DELETE CASCADE,
    tag_id      INTEGER NOT NULL REFERENCES tags(tag_id),
    source      TEXT NOT NULL,     -- 'ai' | 'manual'
    run_id      TEXT,
    recorded_at TEXT NOT NULL,
    UNIQUE (review_id, tag_id)
);

CREATE TABLE IF NOT EXISTS guide_review_tags (
    link_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    review_id   INTEGER NOT NULL REFERENCES guide_reviews(review_id) ON DELETE CASCADE,
    tag_id      INTEGER NOT NULL REFERENCES tags(tag_id),
    source      TEXT NOT NULL,
    run_id      TEXT,
    recorded_at TEXT NOT NULL,
    UNIQUE (review_id, tag_id)
);

CREATE TABLE IF NOT EXISTS traveler_review_tags (
    link_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    review_id   INTEGER NOT NULL REFERENCES traveler_reviews(review_id) ON DELETE CASCADE,
    tag_id      INTEGER NOT NULL REFERENCES tags(tag_id),
    source      TEXT NOT NULL,
    run_id      TEXT,
    recorded_at TEXT NOT NULL,
    UNIQUE (review_id, tag_id)
);

-- Promotion output. AI rows are replaced wholesale on every run.
CREATE TABLE IF NOT EXISTS product_tags (
    promoted_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id  INTEGER NOT NULL REFERENCES products(product_id) ON DELETE CASCADE,
    tag_id      INTEGER NOT NULL REFERENCES tags(tag_id),
    source      TEXT NOT NULL,
    promoted_at TEXT NOT NULL,
    UNIQUE (product_id, tag_id, source)
);

CREATE TABLE IF NOT EXISTS profile_characters (
    subject_id   INTEGER NOT NULL,
    role         TEXT NOT NULL,    -- 'guide' | 'traveler'
    character_id INTEGER NOT NULL REFERENCES characters(character_id),
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (subject_id, role)
);

CREATE INDEX IF NOT EXISTS product_reviews_pending_idx  ON product_reviews(processed_at);
CREATE INDEX IF NOT EXISTS guide_reviews_pending_idx    ON guide_reviews(character_id, processed_at);
CREATE INDEX IF NOT EXISTS traveler_reviews_pending_idx ON traveler_reviews(character_id, processed_at);
CREATE INDEX IF NOT EXISTS bookings_product_idx         ON bookings(product_id);

PRAGMA user_version = 1;
";
