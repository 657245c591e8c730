//! Handlers for the catalog, enrollment and lesson progress.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/courses` | Published courses; admins see every status |
//! | `GET`  | `/courses/{id}` | 404 if not found |
//! | `POST` | `/courses/enroll` | Body: `{"courseId":"…"}` |
//! | `POST` | `/courses/progress` | Body: `{"courseId","lessonId","xpGained"}` |
//! | `GET`  | `/user/courses` | `{enrolledCourses, enrollments}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use scholar_core::{
  achievement,
  course::{Course, CourseStatus},
  profile::Role,
  progress::{self, CompletionOutcome, EnrollOutcome, Enrollment},
  store::{KvStore, keys},
};

use crate::{
  AppState,
  auth::{Caller, CurrentUser},
  docs,
  error::ApiError,
};

// ─── Catalog ──────────────────────────────────────────────────────────────────

/// `GET /courses`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<Course>>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let mut courses = docs::list_courses(state.store.as_ref()).await?;
  if user.profile.role != Role::Admin {
    courses.retain(|c| c.status == CourseStatus::Published);
  }
  Ok(Json(courses))
}

/// `GET /courses/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _caller: Caller,
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

// ─── Enroll ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollBody {
  pub course_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
  #[serde(flatten)]
  pub outcome: EnrollOutcome,
  pub xp:      u64,
  pub level:   u32,
}

/// `POST /courses/enroll`
///
/// The profile is reloaded under the caller's lock, so two concurrent
/// requests for the same course produce one enrollment and one 409. Draft and
/// archived courses are 404 to everyone but admins, as in the catalog.
pub async fn enroll<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Json(body): Json<EnrollBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let course_id = body.course_id.trim();
  if course_id.is_empty() {
    return Err(ApiError::BadRequest("courseId is required".to_owned()));
  }

  let _guard = state.locks.lock(&keys::user(&identity.user_id)).await;
  let mut profile = docs::load_or_create_profile(&state, &identity).await?;
  let course = docs::find_course(state.store.as_ref(), course_id)
    .await?
    .filter(|c| profile.role == Role::Admin || c.status == CourseStatus::Published);

  let outcome = progress::enroll(&mut profile, course_id, course.as_ref(), Utc::now())?;
  achievement::record_unlocks(&mut profile);
  docs::save_profile(state.store.as_ref(), &profile).await?;

  tracing::info!(user_id = %profile.id, %course_id, "enrolled");
  Ok((
    StatusCode::CREATED,
    Json(EnrollResponse {
      outcome,
      xp: profile.xp,
      level: profile.level,
    }),
  ))
}

// ─── Progress ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBody {
  pub course_id: String,
  pub lesson_id: String,
  /// Falls back to the lesson's own reward when omitted.
  #[serde(default)]
  pub xp_gained: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
  #[serde(flatten)]
  pub outcome: CompletionOutcome,
  pub xp:      u64,
  pub level:   u32,
}

/// `POST /courses/progress`
pub async fn record_progress<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Json(body): Json<ProgressBody>,
) -> Result<Json<ProgressResponse>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let course = docs::find_course(state.store.as_ref(), &body.course_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("course {}", body.course_id)))?;
  let xp_gained = body.xp_gained.unwrap_or_else(|| {
    course
      .lessons
      .iter()
      .find(|l| l.id == body.lesson_id)
      .map_or(0, |l| l.xp)
  });

  let _guard = state.locks.lock(&keys::user(&identity.user_id)).await;
  let mut profile = docs::load_or_create_profile(&state, &identity).await?;

  let outcome = progress::record_lesson_completion(
    &mut profile,
    &course,
    &body.lesson_id,
    xp_gained,
    Utc::now(),
  )?;
  if !outcome.already_completed {
    achievement::record_unlocks(&mut profile);
    docs::save_profile(state.store.as_ref(), &profile).await?;
    tracing::info!(
      user_id = %profile.id,
      course_id = %course.id,
      lesson_id = %body.lesson_id,
      progress = outcome.enrollment.progress,
      "lesson completed"
    );
  }

  Ok(Json(ProgressResponse {
    outcome,
    xp: profile.xp,
    level: profile.level,
  }))
}

// ─── Enrolled courses ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCourses {
  pub enrolled_courses: Vec<String>,
  pub enrollments:      Vec<Enrollment>,
}

/// `GET /user/courses`
pub async fn user_courses<S>(user: CurrentUser) -> Json<UserCourses>
where
  S: KvStore + Clone + 'static,
{
  Json(UserCourses {
    enrolled_courses: user.profile.enrolled_course_ids(),
    enrollments:      user.profile.enrollments,
  })
}
