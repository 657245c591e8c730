//! Typed document access on top of [`KvStore`], and the per-document locks
//! that serialize read-modify-write cycles.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, OwnedMutexGuard};

use scholar_core::{
  course::Course,
  profile::{Identity, Role, Tier, UserProfile},
  store::{KvStore, keys},
};

use crate::{AppState, error::ApiError};

// ─── Locks ───────────────────────────────────────────────────────────────────

/// One async mutex per document key, created on first use.
///
/// An entry only the map still references has no holder and no waiter; such
/// entries are dropped on the next `lock` call.
#[derive(Default)]
pub struct DocLocks {
  inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DocLocks {
  /// Wait for exclusive access to `key` within this process.
  pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
    let entry = {
      let mut map = self.inner.lock().await;
      map.retain(|k, m| k == key || Arc::strong_count(m) > 1);
      map.entry(key.to_owned()).or_default().clone()
    };
    entry.lock_owned().await
  }

  #[cfg(test)]
  async fn len(&self) -> usize { self.inner.lock().await.len() }
}

// ─── Generic documents ───────────────────────────────────────────────────────

pub async fn get_doc<S, T>(store: &S, key: &str) -> Result<Option<T>, ApiError>
where
  S: KvStore,
  T: DeserializeOwned,
{
  let Some(value) = store.get(key).await.map_err(ApiError::store)? else {
    return Ok(None);
  };
  serde_json::from_value(value)
    .map(Some)
    .map_err(|e| ApiError::Internal(format!("unreadable document {key}: {e}")))
}

pub async fn put_doc<S, T>(store: &S, key: &str, doc: &T) -> Result<(), ApiError>
where
  S: KvStore,
  T: Serialize,
{
  let value = serde_json::to_value(doc).map_err(|e| ApiError::Internal(e.to_string()))?;
  store.set(key, value).await.map_err(ApiError::store)
}

/// Every readable document under `prefix`. Unreadable ones are skipped.
pub async fn scan_docs<S, T>(store: &S, prefix: &str) -> Result<Vec<T>, ApiError>
where
  S: KvStore,
  T: DeserializeOwned,
{
  let rows = store.scan_prefix(prefix).await.map_err(ApiError::store)?;
  Ok(
    rows
      .into_iter()
      .filter_map(|(key, value)| match serde_json::from_value(value) {
        Ok(doc) => Some(doc),
        Err(e) => {
          tracing::warn!(%key, error = %e, "skipping unreadable document");
          None
        }
      })
      .collect(),
  )
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// Load a stored profile, folding legacy fields into the current shape.
pub async fn load_profile<S: KvStore>(
  store: &S,
  user_id: &str,
) -> Result<Option<UserProfile>, ApiError> {
  let mut profile: Option<UserProfile> = get_doc(store, &keys::user(user_id)).await?;
  if let Some(p) = profile.as_mut() {
    p.normalize(Utc::now());
  }
  Ok(profile)
}

pub async fn save_profile<S: KvStore>(store: &S, profile: &UserProfile) -> Result<(), ApiError> {
  put_doc(store, &keys::user(&profile.id), profile).await
}

pub fn is_admin_email<S>(state: &AppState<S>, email: &str) -> bool
where
  S: KvStore + Clone + 'static,
{
  state
    .config
    .admin_email
    .as_deref()
    .is_some_and(|a| a.trim().eq_ignore_ascii_case(email.trim()))
}

/// Return the caller's profile, creating it on first sight.
///
/// Takes the caller's lock; handlers that already hold it use
/// [`load_or_create_profile`].
pub async fn ensure_profile<S>(
  state: &AppState<S>,
  identity: &Identity,
) -> Result<UserProfile, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let _guard = state.locks.lock(&keys::user(&identity.user_id)).await;
  load_or_create_profile(state, identity).await
}

/// [`ensure_profile`] for callers holding the lock on `user:<id>`.
///
/// The configured admin email always ends up with the fixed admin fields.
/// Legacy documents are rewritten in their normalized form.
pub async fn load_or_create_profile<S>(
  state: &AppState<S>,
  identity: &Identity,
) -> Result<UserProfile, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let now = Utc::now();
  let admin = is_admin_email(state, &identity.email);

  let stored: Option<UserProfile> =
    get_doc(state.store.as_ref(), &keys::user(&identity.user_id)).await?;
  if let Some(mut profile) = stored {
    let mut changed = profile.normalize(now);
    if admin && (profile.role != Role::Admin || profile.subscription_tier != Tier::Enterprise) {
      profile.role = Role::Admin;
      profile.subscription_tier = Tier::Enterprise;
      profile.name = "Administrator".to_owned();
      changed = true;
    }
    if changed {
      save_profile(state.store.as_ref(), &profile).await?;
    }
    return Ok(profile);
  }

  let profile = if admin {
    UserProfile::admin(identity, now)
  } else {
    UserProfile::from_identity(identity, now)
  };
  save_profile(state.store.as_ref(), &profile).await?;
  tracing::info!(user_id = %profile.id, role = %profile.role, "created profile");
  Ok(profile)
}

// ─── Courses ─────────────────────────────────────────────────────────────────

/// Look a course up by id: authored courses first, then the seeded catalog.
pub async fn find_course<S: KvStore>(store: &S, id: &str) -> Result<Option<Course>, ApiError> {
  if let Some(course) = get_doc(store, &keys::course(id)).await? {
    return Ok(Some(course));
  }
  get_doc(store, &keys::mock_course(id)).await
}

/// Every course in both namespaces. An authored course shadows a seeded one
/// with the same id.
pub async fn list_courses<S: KvStore>(store: &S) -> Result<Vec<Course>, ApiError> {
  let mut courses: Vec<Course> = scan_docs(store, keys::COURSE_PREFIX).await?;
  let mocks: Vec<Course> = scan_docs(store, keys::MOCK_COURSE_PREFIX).await?;
  for mock in mocks {
    if !courses.iter().any(|c| c.id == mock.id) {
      courses.push(mock);
    }
  }
  courses.sort_by(|a, b| a.id.cmp(&b.id));
  Ok(courses)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn released_locks_are_pruned() {
    let locks = DocLocks::default();
    for i in 0..1000 {
      let _guard = locks.lock(&keys::password_reset(&format!("u{i}@x.test"))).await;
    }
    assert_eq!(locks.len().await, 1);

    let held = locks.lock("user:a").await;
    let _other = locks.lock("user:b").await;
    assert_eq!(locks.len().await, 2);
    drop(held);
    let _again = locks.lock("user:c").await;
    assert_eq!(locks.len().await, 2);
  }

  #[tokio::test]
  async fn same_key_is_exclusive() {
    let locks = Arc::new(DocLocks::default());
    let guard = locks.lock("user:a").await;

    let waiter = {
      let locks = locks.clone();
      tokio::spawn(async move {
        let _g = locks.lock("user:a").await;
      })
    };
    tokio::task::yield_now().await;
    let _unrelated = locks.lock("user:z").await;
    assert!(!waiter.is_finished());

    drop(guard);
    waiter.await.unwrap();
  }
}
