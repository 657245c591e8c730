//! The `KvStore` trait and the key namespace used on top of it.
//!
//! The trait is implemented by storage backends (e.g. `scholar-store-sqlite`).
//! Higher layers (`scholar-api`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde_json::Value;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// An opaque document store: string keys, JSON values, prefix scans.
///
/// There are no transactions. Callers read a whole document, change it in
/// memory and write it back.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait KvStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the value at `key`. Returns `None` if absent.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Insert or replace the value at `key`.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove `key`. Returns `true` if something was removed.
  fn delete<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// All `(key, value)` pairs whose key starts with `prefix`, ordered by key.
  fn scan_prefix<'a>(
    &'a self,
    prefix: &'a str,
  ) -> impl Future<Output = Result<Vec<(String, Value)>, Self::Error>> + Send + 'a;
}

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Builders for every document key. Nothing else should format keys.
pub mod keys {
  pub const USER_PREFIX: &str = "user:";
  pub const COURSE_PREFIX: &str = "course:";
  pub const MOCK_COURSE_PREFIX: &str = "mock_course:";
  pub const POST_PREFIX: &str = "post:";

  pub fn user(id: &str) -> String { format!("{USER_PREFIX}{id}") }

  pub fn course(id: &str) -> String { format!("{COURSE_PREFIX}{id}") }

  pub fn mock_course(id: &str) -> String { format!("{MOCK_COURSE_PREFIX}{id}") }

  /// Emails are case-insensitive, so the key uses the lowercased form.
  pub fn password_reset(email: &str) -> String {
    format!("password_reset:{}", email.trim().to_lowercase())
  }

  pub fn teacher_students(teacher_id: &str) -> String {
    format!("teacher_students:{teacher_id}")
  }

  pub fn invite(code: &str) -> String { format!("invite:{code}") }

  pub fn post(id: &str) -> String { format!("{POST_PREFIX}{id}") }

  /// Marks a catalog course as seeded once, even after it is deleted.
  pub fn seeded(course_id: &str) -> String { format!("seeded:{course_id}") }
}

#[cfg(test)]
mod tests {
  use super::keys;

  #[test]
  fn keys_share_prefixes() {
    assert!(keys::user("abc").starts_with(keys::USER_PREFIX));
    assert!(keys::post("p").starts_with(keys::POST_PREFIX));
    // `course:` must not be a prefix of `mock_course:` keys or vice versa.
    assert!(!keys::mock_course("x").starts_with(keys::COURSE_PREFIX));
    assert_eq!(keys::password_reset(" Ada@Example.com "), "password_reset:ada@example.com");
  }
}
