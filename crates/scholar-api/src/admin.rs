//! Admin-only handlers for course authoring and user management.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/courses/{id}` | 404 if not found |
//! | `POST`   | `/admin/courses` | Body: full course; replaces the stored one |
//! | `DELETE` | `/admin/courses/{id}` | Removes the whole record |
//! | `GET`    | `/admin/users` | Every profile |
//! | `PUT`    | `/admin/users/{id}` | Body: `{"role"?, "subscriptionTier"?, "xp"?}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;

use scholar_core::{
  achievement,
  course::{Course, CourseKind},
  profile::{Role, Tier, UserProfile},
  reward,
  store::{KvStore, keys},
};

use crate::{AppState, auth::AdminUser, docs, error::ApiError, profile::ProfileResponse};

// ─── Courses ──────────────────────────────────────────────────────────────────

/// `GET /admin/courses/{id}`
pub async fn get_course<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<String>,
) -> Result<Json<Course>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  docs::find_course(state.store.as_ref(), &id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("course {id}")))
}

/// `POST /admin/courses`
///
/// Last write wins. A course whose kind moved it to the other namespace
/// leaves no copy behind in the old one.
pub async fn save_course<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Json(course): Json<Course>,
) -> Result<Json<Course>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  if course.id.trim().is_empty() {
    return Err(ApiError::BadRequest("course id is required".to_owned()));
  }
  if course.title.trim().is_empty() {
    return Err(ApiError::BadRequest("course title is required".to_owned()));
  }
  if let Some(id) = course.invalid_lesson_id() {
    return Err(ApiError::BadRequest(format!(
      "lesson ids must be non-empty and unique: {id:?}"
    )));
  }

  let key = course.storage_key();
  let stale = match course.kind {
    CourseKind::Mock => keys::course(&course.id),
    CourseKind::Custom | CourseKind::CrashCourse => keys::mock_course(&course.id),
  };

  let _guard = state.locks.lock(&key).await;
  docs::put_doc(state.store.as_ref(), &key, &course).await?;
  state.store.delete(&stale).await.map_err(ApiError::store)?;

  tracing::info!(
    course_id = %course.id,
    lessons = course.lesson_count(),
    by = %admin.profile.id,
    "course saved"
  );
  Ok(Json(course))
}

/// `DELETE /admin/courses/{id}`
pub async fn delete_course<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let custom = state
    .store
    .delete(&keys::course(&id))
    .await
    .map_err(ApiError::store)?;
  let mock = state
    .store
    .delete(&keys::mock_course(&id))
    .await
    .map_err(ApiError::store)?;

  if !(custom || mock) {
    return Err(ApiError::NotFound(format!("course {id}")));
  }
  tracing::info!(course_id = %id, by = %admin.profile.id, "course deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Users ────────────────────────────────────────────────────────────────────

/// `GET /admin/users`
pub async fn list_users<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<UserProfile>>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let profiles = docs::scan_docs(state.store.as_ref(), keys::USER_PREFIX).await?;
  Ok(Json(profiles))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
  pub role:              Option<Role>,
  pub subscription_tier: Option<Tier>,
  pub xp:                Option<u64>,
}

/// `PUT /admin/users/{id}`
///
/// The one path that may lower XP.
pub async fn update_user<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<String>,
  Json(update): Json<UserUpdate>,
) -> Result<Json<ProfileResponse>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let _guard = state.locks.lock(&keys::user(&id)).await;
  let mut profile = docs::load_profile(state.store.as_ref(), &id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;

  if let Some(role) = update.role {
    profile.role = role;
  }
  if let Some(tier) = update.subscription_tier {
    profile.subscription_tier = tier;
  }
  if let Some(xp) = update.xp {
    reward::set_xp(&mut profile, xp);
  }
  achievement::record_unlocks(&mut profile);
  docs::save_profile(state.store.as_ref(), &profile).await?;

  tracing::info!(
    user_id = %profile.id,
    role = %profile.role,
    tier = %profile.subscription_tier,
    xp = profile.xp,
    by = %admin.profile.id,
    "user updated"
  );
  Ok(Json(ProfileResponse::new(profile)))
}
