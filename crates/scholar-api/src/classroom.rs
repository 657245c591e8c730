//! Handlers for teacher invite codes and class rosters.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/teacher/invites` | Teacher or admin; returns `{"code"}` |
//! | `GET`  | `/teacher/students` | The caller's roster with summaries |
//! | `POST` | `/invites/{code}/redeem` | Joins the issuing teacher's roster |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use serde_json::json;

use scholar_core::{
  classroom::{Invite, Roster},
  profile::Role,
  reward,
  store::{KvStore, keys},
};

use crate::{
  AppState,
  auth::CurrentUser,
  docs,
  error::ApiError,
};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

/// A random code from an alphabet without look-alike characters.
fn new_code() -> String {
  let mut bytes = [0u8; CODE_LEN];
  OsRng.fill_bytes(&mut bytes);
  bytes
    .iter()
    .map(|b| CODE_ALPHABET[usize::from(*b) % CODE_ALPHABET.len()] as char)
    .collect()
}

// ─── Invites ──────────────────────────────────────────────────────────────────

/// `POST /teacher/invites`
pub async fn create_invite<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore + Clone + 'static,
{
  user.require_role(&[Role::Teacher])?;

  let invite = loop {
    let code = new_code();
    let key = keys::invite(&code);
    let _guard = state.locks.lock(&key).await;
    if state.store.get(&key).await.map_err(ApiError::store)?.is_some() {
      continue;
    }
    let invite = Invite {
      code,
      teacher_id:  user.profile.id.clone(),
      created_at:  Utc::now(),
      redeemed_by: Vec::new(),
    };
    docs::put_doc(state.store.as_ref(), &key, &invite).await?;
    break invite;
  };

  tracing::info!(teacher_id = %invite.teacher_id, code = %invite.code, "invite created");
  Ok((StatusCode::CREATED, Json(json!({ "code": invite.code }))))
}

/// `POST /invites/{code}/redeem`
pub async fn redeem<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let identity = user.identity;
  let code = code.trim().to_uppercase();
  let invite_key = keys::invite(&code);
  let _invite_guard = state.locks.lock(&invite_key).await;
  let mut invite: Invite = docs::get_doc(state.store.as_ref(), &invite_key)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("invite {code}")))?;
  if invite.teacher_id == identity.user_id {
    return Err(ApiError::BadRequest("cannot redeem your own invite".to_owned()));
  }

  let roster_key = keys::teacher_students(&invite.teacher_id);
  let added = {
    let _roster_guard = state.locks.lock(&roster_key).await;
    let mut roster: Roster = docs::get_doc(state.store.as_ref(), &roster_key)
      .await?
      .unwrap_or_else(|| Roster::new(&invite.teacher_id));
    let added = roster.add(&identity.user_id, Utc::now());
    if added {
      docs::put_doc(state.store.as_ref(), &roster_key, &roster).await?;
    }
    added
  };
  if invite.redeem(&identity.user_id) {
    docs::put_doc(state.store.as_ref(), &invite_key, &invite).await?;
  }

  if added {
    tracing::info!(teacher_id = %invite.teacher_id, student_id = %identity.user_id, "joined class");
  }
  Ok(Json(json!({ "teacherId": invite.teacher_id, "added": added })))
}

// ─── Roster ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
  pub id:                String,
  pub name:              String,
  pub email:             String,
  pub xp:                u64,
  pub level:             u32,
  pub enrolled_courses:  usize,
  pub lessons_completed: usize,
  pub joined_at:         DateTime<Utc>,
}

/// `GET /teacher/students`
///
/// Students whose profile has since disappeared are left out.
pub async fn students<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
) -> Result<Json<Vec<StudentSummary>>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  user.require_role(&[Role::Teacher])?;

  let roster: Option<Roster> =
    docs::get_doc(state.store.as_ref(), &keys::teacher_students(&user.profile.id)).await?;
  let mut out = Vec::new();
  for link in roster.map(|r| r.students).unwrap_or_default() {
    let Some(p) = docs::load_profile(state.store.as_ref(), &link.student_id).await? else {
      continue;
    };
    out.push(StudentSummary {
      level:             reward::level_for(p.xp),
      enrolled_courses:  p.enrollments.len(),
      lessons_completed: p.lessons_completed(),
      id:                p.id,
      name:              p.name,
      email:             p.email,
      xp:                p.xp,
      joined_at:         link.joined_at,
    });
  }
  Ok(Json(out))
}
