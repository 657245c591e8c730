//! Handlers for the caller's profile, achievements and the leaderboard.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/user/profile` | Degrades to identity metadata if the store fails |
//! | `PUT`  | `/user/profile` | Patch-merge of name, role, bio, avatarUrl |
//! | `GET`  | `/user/achievements` | Role-specific list with unlock state |
//! | `GET`  | `/leaderboard` | Top profiles by XP |

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use scholar_core::{
  achievement::{self, AchievementStatus},
  profile::{ProfilePatch, Role, UserProfile},
  reward::{self, LevelProgress},
  store::{KvStore, keys},
};

use crate::{
  AppState,
  auth::{Caller, CurrentUser},
  docs,
  error::ApiError,
};

// ─── Profile ──────────────────────────────────────────────────────────────────

/// A profile as returned to its owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
  #[serde(flatten)]
  pub profile:          UserProfile,
  pub enrolled_courses: Vec<String>,
  pub level_progress:   LevelProgress,
  /// Set when the stored profile could not be read and this one was built
  /// from identity metadata alone.
  pub degraded:         bool,
}

impl ProfileResponse {
  pub fn new(profile: UserProfile) -> Self {
    Self {
      enrolled_courses: profile.enrolled_course_ids(),
      level_progress:   reward::level_progress(profile.xp),
      profile,
      degraded:         false,
    }
  }
}

/// `GET /user/profile`
pub async fn get_own<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
) -> Result<Json<ProfileResponse>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  match docs::ensure_profile(&state, &identity).await {
    Ok(profile) => Ok(Json(ProfileResponse::new(profile))),
    Err(ApiError::Store(e)) => {
      tracing::warn!(user_id = %identity.user_id, error = %e, "serving degraded profile");
      let fallback = if docs::is_admin_email(&state, &identity.email) {
        UserProfile::admin(&identity, Utc::now())
      } else {
        UserProfile::from_identity(&identity, Utc::now())
      };
      let mut response = ProfileResponse::new(fallback);
      response.degraded = true;
      Ok(Json(response))
    }
    Err(e) => Err(e),
  }
}

/// `PUT /user/profile`
pub async fn update_own<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Json(patch): Json<ProfilePatch>,
) -> Result<Json<ProfileResponse>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  if patch.role == Some(Role::Admin) {
    return Err(ApiError::BadRequest("role cannot be set to admin".to_owned()));
  }
  if let Some(name) = &patch.name
    && name.trim().is_empty()
  {
    return Err(ApiError::BadRequest("name must not be empty".to_owned()));
  }

  let _guard = state.locks.lock(&keys::user(&identity.user_id)).await;
  let mut profile = docs::load_or_create_profile(&state, &identity).await?;
  // Admins keep their role; only the configured account holds it anyway.
  let was_admin = profile.role == Role::Admin;
  profile.apply_patch(patch);
  if was_admin {
    profile.role = Role::Admin;
  }
  docs::save_profile(state.store.as_ref(), &profile).await?;

  Ok(Json(ProfileResponse::new(profile)))
}

// ─── Achievements ─────────────────────────────────────────────────────────────

/// `GET /user/achievements`
pub async fn achievements<S>(user: CurrentUser) -> Json<Vec<AchievementStatus>>
where
  S: KvStore + Clone + 'static,
{
  Json(achievement::evaluate(&user.profile))
}

// ─── Leaderboard ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
  pub rank:  usize,
  pub id:    String,
  pub name:  String,
  pub xp:    u64,
  pub level: u32,
}

/// `GET /leaderboard`
pub async fn leaderboard<S>(
  State(state): State<AppState<S>>,
  _caller: Caller,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let mut profiles: Vec<UserProfile> =
    docs::scan_docs(state.store.as_ref(), keys::USER_PREFIX).await?;
  // Ties go to whoever got there first.
  profiles.sort_by(|a, b| b.xp.cmp(&a.xp).then(a.created_at.cmp(&b.created_at)));

  let entries = profiles
    .into_iter()
    .take(state.config.leaderboard_size)
    .enumerate()
    .map(|(i, p)| LeaderboardEntry {
      rank:  i + 1,
      level: reward::level_for(p.xp),
      id:    p.id,
      name:  p.name,
      xp:    p.xp,
    })
    .collect();
  Ok(Json(entries))
}
