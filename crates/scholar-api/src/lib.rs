//! JSON REST API for Scholar.
//!
//! Exposes an axum [`Router`] backed by any [`KvStore`]. Callers authenticate
//! with a bearer token that an [`auth::IdentityProvider`] resolves to an
//! identity; profiles are created on first sight.

pub mod admin;
pub mod auth;
pub mod classroom;
pub mod community;
pub mod courses;
pub mod docs;
pub mod error;
pub mod password_reset;
pub mod profile;
pub mod seed;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, post, put},
};
use scholar_core::{reset::DEFAULT_TTL_MINUTES, store::KvStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use auth::{IdentityProvider, TokenEntry};
use docs::DocLocks;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SCHOLAR_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                    String,
  #[serde(default = "default_port")]
  pub port:                    u16,
  #[serde(default = "default_store_path")]
  pub store_path:              PathBuf,
  /// The account that is always given the admin profile.
  #[serde(default)]
  pub admin_email:             Option<String>,
  #[serde(default = "default_reset_ttl")]
  pub reset_token_ttl_minutes: i64,
  #[serde(default = "default_leaderboard_size")]
  pub leaderboard_size:        usize,
  #[serde(default = "default_seed_catalog")]
  pub seed_catalog:            bool,
  #[serde(default)]
  pub tokens:                  Vec<TokenEntry>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/scholar/scholar.sqlite") }
fn default_reset_ttl() -> i64 { DEFAULT_TTL_MINUTES }
fn default_leaderboard_size() -> usize { 10 }
fn default_seed_catalog() -> bool { true }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                    default_host(),
      port:                    default_port(),
      store_path:              default_store_path(),
      admin_email:             None,
      reset_token_ttl_minutes: default_reset_ttl(),
      leaderboard_size:        default_leaderboard_size(),
      seed_catalog:            default_seed_catalog(),
      tokens:                  Vec::new(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: KvStore> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub identity: Arc<dyn IdentityProvider>,
  pub locks:    Arc<DocLocks>,
}

impl<S: KvStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig, identity: Arc<dyn IdentityProvider>) -> Self {
    Self {
      store: Arc::new(store),
      config: Arc::new(config),
      identity,
      locks: Arc::new(DocLocks::default()),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router over `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: KvStore + Clone + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Catalog and progress
    .route("/courses", get(courses::list::<S>))
    .route("/courses/enroll", post(courses::enroll::<S>))
    .route("/courses/progress", post(courses::record_progress::<S>))
    .route("/courses/{id}", get(courses::get_one::<S>))
    .route("/user/courses", get(courses::user_courses::<S>))
    // Profile
    .route("/user/profile", get(profile::get_own::<S>).put(profile::update_own::<S>))
    .route("/user/achievements", get(profile::achievements::<S>))
    .route("/leaderboard", get(profile::leaderboard::<S>))
    // Admin
    .route("/admin/courses", post(admin::save_course::<S>))
    .route(
      "/admin/courses/{id}",
      get(admin::get_course::<S>).delete(admin::delete_course::<S>),
    )
    .route("/admin/users", get(admin::list_users::<S>))
    .route("/admin/users/{id}", put(admin::update_user::<S>))
    // Community
    .route("/community/posts", get(community::list::<S>).post(community::create::<S>))
    .route("/community/posts/{id}", axum::routing::delete(community::delete_one::<S>))
    .route("/community/posts/{id}/comments", post(community::comment::<S>))
    .route("/community/posts/{id}/like", post(community::like::<S>))
    // Classroom
    .route("/teacher/invites", post(classroom::create_invite::<S>))
    .route("/teacher/students", get(classroom::students::<S>))
    .route("/invites/{code}/redeem", post(classroom::redeem::<S>))
    // Password reset
    .route("/auth/password-reset/request", post(password_reset::request::<S>))
    .route("/auth/password-reset/confirm", post(password_reset::confirm::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /health`
async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}
