/// Run on every open; safe to repeat.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per document. Keys are namespaced strings such as `user:<id>`.
CREATE TABLE IF NOT EXISTS kv (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,   -- JSON document
    updated_at TEXT NOT NULL    -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";
