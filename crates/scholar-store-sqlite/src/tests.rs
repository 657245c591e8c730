//! Integration tests for `SqliteStore` against an in-memory database.

use scholar_core::store::{KvStore, keys};
use serde_json::json;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Get / set ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get("user:nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn set_and_get_roundtrip() {
  let s = store().await;
  let doc = json!({ "id": "u1", "xp": 150, "enrollments": [] });

  s.set(&keys::user("u1"), doc.clone()).await.unwrap();

  let fetched = s.get(&keys::user("u1")).await.unwrap();
  assert_eq!(fetched, Some(doc));
}

#[tokio::test]
async fn set_replaces_whole_document() {
  let s = store().await;
  s.set("course:c1", json!({ "title": "Old", "lessons": [1, 2, 3] }))
    .await
    .unwrap();
  s.set("course:c1", json!({ "title": "New" })).await.unwrap();

  let fetched = s.get("course:c1").await.unwrap().unwrap();
  assert_eq!(fetched, json!({ "title": "New" }));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_reports_whether_removed() {
  let s = store().await;
  s.set("invite:ABC", json!({ "code": "ABC" })).await.unwrap();

  assert!(s.delete("invite:ABC").await.unwrap());
  assert!(!s.delete("invite:ABC").await.unwrap());
  assert!(s.get("invite:ABC").await.unwrap().is_none());
}

// ─── Prefix scan ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_prefix_is_ordered_and_exact() {
  let s = store().await;
  s.set(&keys::course("b"), json!(2)).await.unwrap();
  s.set(&keys::course("a"), json!(1)).await.unwrap();
  s.set(&keys::mock_course("a"), json!(3)).await.unwrap();
  s.set(&keys::user("a"), json!(4)).await.unwrap();

  let courses = s.scan_prefix(keys::COURSE_PREFIX).await.unwrap();
  let got: Vec<_> = courses.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
  assert_eq!(got, vec![("course:a", json!(1)), ("course:b", json!(2))]);

  let mocks = s.scan_prefix(keys::MOCK_COURSE_PREFIX).await.unwrap();
  assert_eq!(mocks.len(), 1);
}

#[tokio::test]
async fn scan_prefix_treats_wildcards_literally() {
  let s = store().await;
  s.set("post:x_1", json!(1)).await.unwrap();
  s.set("post:xy1", json!(2)).await.unwrap();

  let hits = s.scan_prefix("post:x_").await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].0, "post:x_1");
}

#[tokio::test]
async fn file_store_persists_across_reopen() {
  let dir = std::env::temp_dir().join(format!("scholar-store-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("kv.sqlite");
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.set("user:u1", json!({ "xp": 50 })).await.unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.get("user:u1").await.unwrap(), Some(json!({ "xp": 50 })));

  drop(s);
  let _ = std::fs::remove_dir_all(&dir);
}
