//! Handlers for the community feed.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/community/posts` | Newest first |
//! | `POST`   | `/community/posts` | Body: `{"content":"…"}`; +25 XP |
//! | `DELETE` | `/community/posts/{id}` | Author or admin |
//! | `POST`   | `/community/posts/{id}/comments` | Body: `{"content":"…"}`; +10 XP |
//! | `POST`   | `/community/posts/{id}/like` | Toggle |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use scholar_core::{
  achievement,
  community::{Comment, Post},
  profile::{Identity, Role},
  reward::{self, Reward},
  store::{KvStore, keys},
};

use crate::{
  AppState,
  auth::{Caller, CurrentUser},
  docs,
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct ContentBody {
  pub content: String,
}

impl ContentBody {
  fn into_content(self) -> Result<String, ApiError> {
    let content = self.content.trim();
    if content.is_empty() {
      return Err(ApiError::BadRequest("content must not be empty".to_owned()));
    }
    Ok(content.to_owned())
  }
}

/// Grant `reward` to the caller under their lock.
async fn grant<S>(
  state: &AppState<S>,
  identity: &Identity,
  reward: Reward,
  posted: bool,
) -> Result<u64, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let _guard = state.locks.lock(&keys::user(&identity.user_id)).await;
  let mut profile = docs::load_or_create_profile(state, identity).await?;
  let gained = reward::award(&mut profile, reward, Utc::now().date_naive());
  if posted {
    profile.posts_count += 1;
  }
  achievement::record_unlocks(&mut profile);
  docs::save_profile(state.store.as_ref(), &profile).await?;
  Ok(gained)
}

async fn load_post<S: KvStore>(store: &S, id: &str) -> Result<Post, ApiError> {
  docs::get_doc(store, &keys::post(id))
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("post {id}")))
}

// ─── Feed ─────────────────────────────────────────────────────────────────────

/// `GET /community/posts`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _caller: Caller,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let mut posts: Vec<Post> = docs::scan_docs(state.store.as_ref(), keys::POST_PREFIX).await?;
  posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  Ok(Json(posts))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created<T> {
  #[serde(flatten)]
  pub item:      T,
  pub xp_gained: u64,
}

/// `POST /community/posts`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let content = body.into_content()?;
  let post = Post::new(&user.profile.id, &user.profile.name, content, Utc::now());
  docs::put_doc(state.store.as_ref(), &keys::post(&post.id), &post).await?;

  let xp_gained = grant(&state, &user.identity, Reward::CommunityPost, true).await?;
  tracing::info!(post_id = %post.id, author = %post.author_id, "post created");
  Ok((StatusCode::CREATED, Json(Created { item: post, xp_gained })))
}

/// `DELETE /community/posts/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let key = keys::post(&id);
  let _guard = state.locks.lock(&key).await;
  let post = load_post(state.store.as_ref(), &id).await?;
  if post.author_id != user.profile.id && user.profile.role != Role::Admin {
    return Err(ApiError::ForbiddenRole { required: Role::Admin });
  }
  state.store.delete(&key).await.map_err(ApiError::store)?;
  tracing::info!(post_id = %id, by = %user.profile.id, "post deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reactions ────────────────────────────────────────────────────────────────

/// `POST /community/posts/{id}/comments`
pub async fn comment<S>(
  State(state): State<AppState<S>>,
  user: CurrentUser,
  Path(id): Path<String>,
  Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let content = body.into_content()?;
  let comment: Comment = {
    let key = keys::post(&id);
    let _guard = state.locks.lock(&key).await;
    let mut post = load_post(state.store.as_ref(), &id).await?;
    let comment = post
      .add_comment(&user.profile.id, &user.profile.name, content, Utc::now())
      .clone();
    docs::put_doc(state.store.as_ref(), &key, &post).await?;
    comment
  };

  let xp_gained = grant(&state, &user.identity, Reward::Comment, false).await?;
  Ok((StatusCode::CREATED, Json(Created { item: comment, xp_gained })))
}

/// `POST /community/posts/{id}/like`
pub async fn like<S>(
  State(state): State<AppState<S>>,
  Caller(identity): Caller,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let key = keys::post(&id);
  let _guard = state.locks.lock(&key).await;
  let mut post = load_post(state.store.as_ref(), &id).await?;
  let liked = post.toggle_like(&identity.user_id);
  docs::put_doc(state.store.as_ref(), &key, &post).await?;
  Ok(Json(json!({ "liked": liked, "likes": post.likes.len() })))
}
