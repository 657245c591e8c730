//! Password-reset handlers. Neither requires a bearer token.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/password-reset/request` | Body: `{"email"}`; always 202 |
//! | `POST` | `/auth/password-reset/confirm` | Body: `{"email","token","newPassword"}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use serde_json::json;

use scholar_core::{
  reset::PasswordReset,
  store::{KvStore, keys},
};

use crate::{AppState, auth::hash_token, docs, error::ApiError};

pub const MIN_PASSWORD_LEN: usize = 8;

fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Deserialize)]
pub struct RequestBody {
  pub email: String,
}

/// `POST /auth/password-reset/request`
///
/// The response does not reveal whether the address belongs to anyone.
pub async fn request<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RequestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore + Clone + 'static,
{
  let email = body.email.trim().to_lowercase();
  if !email.contains('@') {
    return Err(ApiError::BadRequest("a valid email is required".to_owned()));
  }

  let token = new_token();
  let ttl = Duration::minutes(state.config.reset_token_ttl_minutes);
  let record = PasswordReset::issue(hash_token(&token), Utc::now(), ttl);

  let key = keys::password_reset(&email);
  {
    let _guard = state.locks.lock(&key).await;
    docs::put_doc(state.store.as_ref(), &key, &record).await?;
  }
  state.identity.deliver_reset_token(&email, &token);
  tracing::info!(%email, expires_at = %record.expires_at, "password reset requested");

  Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBody {
  pub email:        String,
  pub token:        String,
  pub new_password: String,
}

/// `POST /auth/password-reset/confirm`
///
/// The record is only marked used once the identity provider accepted the
/// new password.
pub async fn confirm<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<ConfirmBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KvStore + Clone + 'static,
{
  if body.new_password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let email = body.email.trim().to_lowercase();
  let key = keys::password_reset(&email);
  let _guard = state.locks.lock(&key).await;
  let mut record: PasswordReset = docs::get_doc(state.store.as_ref(), &key)
    .await?
    .ok_or_else(|| ApiError::NotFound("no password reset requested for this email".to_owned()))?;

  record.redeem(&hash_token(body.token.trim()), Utc::now())?;
  state
    .identity
    .reset_password(&email, &body.new_password)
    .map_err(|e| ApiError::Upstream(e.to_string()))?;
  docs::put_doc(state.store.as_ref(), &key, &record).await?;

  tracing::info!(%email, "password reset completed");
  Ok(Json(json!({ "status": "password_updated" })))
}
