//! Database schema and migrations for Boerse.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: postings
    r#"
CREATE TABLE postings (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid                TEXT NOT NULL UNIQUE,
    admin_token         TEXT NOT NULL,
    verify_token        TEXT NOT NULL,
    email               TEXT NOT NULL,
    title               TEXT NOT NULL,
    institute           TEXT NOT NULL DEFAULT '',
    advisor             TEXT NOT NULL DEFAULT '',
    supervisor          TEXT NOT NULL DEFAULT '',
    audience            TEXT NOT NULL DEFAULT '',
    category            TEXT NOT NULL DEFAULT '',
    posting_type        TEXT NOT NULL DEFAULT '',
    degree              TEXT NOT NULL DEFAULT '',
    start_date          TEXT NOT NULL DEFAULT '',
    required_months     INTEGER NOT NULL DEFAULT 0,
    required_effort     TEXT NOT NULL DEFAULT '',
    text                TEXT NOT NULL,
    verified            INTEGER NOT NULL DEFAULT 0,
    deleted             INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL DEFAULT (datetime('now')),
    last_updated_at     TEXT,
    last_verified_at    TEXT
);

CREATE UNIQUE INDEX idx_postings_admin_token ON postings(admin_token);
CREATE UNIQUE INDEX idx_postings_verify_token ON postings(verify_token);
CREATE INDEX idx_postings_listing ON postings(verified, deleted, created_at);
"#,
    // v2: admin review flag and reminder bookkeeping
    r#"
ALTER TABLE postings ADD COLUMN requires_admin_review INTEGER NOT NULL DEFAULT 0;
ALTER TABLE postings ADD COLUMN last_reminded_at TEXT;
ALTER TABLE postings ADD COLUMN reminder_count INTEGER NOT NULL DEFAULT 0;

CREATE INDEX idx_postings_pending ON postings(verified, deleted, reminder_count);
"#,
];
