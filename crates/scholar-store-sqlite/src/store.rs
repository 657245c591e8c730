//! [`SqliteStore`], the SQLite implementation of [`KvStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use serde_json::Value;

use scholar_core::store::KvStore;

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Scholar document store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
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
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn decode(key: &str, raw: &str) -> Result<Value> {
  serde_json::from_str(raw).map_err(|source| Error::Json {
    key: key.to_owned(),
    source,
  })
}

// ─── KvStore impl ────────────────────────────────────────────────────────────

impl KvStore for SqliteStore {
  type Error = Error;

  async fn get(&self, key: &str) -> Result<Option<Value>> {
    let key_owned = key.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM kv WHERE key = ?1",
              rusqlite::params![key_owned],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| decode(key, &r)).transpose()
  }

  async fn set(&self, key: &str, value: Value) -> Result<()> {
    let key_owned  = key.to_owned();
    let value_str  = value.to_string();
    let updated_at = Utc::now().to_rfc3339();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value      = excluded.value,
             updated_at = excluded.updated_at",
          rusqlite::params![key_owned, value_str, updated_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<bool> {
    let key_owned = key.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key_owned])?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
    let prefix_owned = prefix.to_owned();

    // `substr` rather than LIKE so `_` and `%` in keys need no escaping.
    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT key, value FROM kv
           WHERE substr(key, 1, length(?1)) = ?1
           ORDER BY key",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![prefix_owned], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(key, raw)| {
        let value = decode(&key, &raw)?;
        Ok((key, value))
      })
      .collect()
  }
}
