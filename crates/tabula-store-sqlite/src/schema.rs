//! SQL schema for the Tabula SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- rowid order is creation order.
CREATE TABLE IF NOT EXISTS datastores (
    datastore_id TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- rowid order is column order.
CREATE TABLE IF NOT EXISTS fields (
    field_id     TEXT PRIMARY KEY,
    datastore_id TEXT NOT NULL REFERENCES datastores(datastore_id) ON DELETE CASCADE,
    name         TEXT NOT NULL,
    field_type   TEXT NOT NULL,   -- 'string' | 'number' | 'boolean' | 'date'
    default_json TEXT NOT NULL,
    UNIQUE (datastore_id, name)
);

-- values_json is an object keyed by field_id. Upserts keep seq, so seq
-- order is row insertion order.
CREATE TABLE IF NOT EXISTS records (
    seq          INTEGER PRIMARY KEY,
    datastore_id TEXT NOT NULL REFERENCES datastores(datastore_id) ON DELETE CASCADE,
    record_id    TEXT NOT NULL,
    values_json  TEXT NOT NULL,
    UNIQUE (datastore_id, record_id)
);

CREATE INDEX IF NOT EXISTS fields_datastore_idx  ON fields(datastore_id);

PRAGMA user_version = 1;
";
