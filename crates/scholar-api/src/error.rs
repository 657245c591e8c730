//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use scholar_core::profile::{Role, Tier};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthenticated,

  #[error("the {required} role is required")]
  ForbiddenRole { required: Role },

  #[error("this course requires the {required} tier (current tier: {current})")]
  ForbiddenTier { required: Tier, current: Tier },

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("identity provider error: {0}")]
  Upstream(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl From<scholar_core::Error> for ApiError {
  fn from(e: scholar_core::Error) -> Self {
    use scholar_core::Error as E;
    match e {
      E::AlreadyEnrolled(_) | E::ResetTokenUsed | E::ResetTokenExpired => {
        Self::Conflict(e.to_string())
      }
      E::NotEnrolled(_)
      | E::CourseNotFound(_)
      | E::LessonNotFound { .. }
      | E::NodeNotFound(_) => Self::NotFound(e.to_string()),
      E::InsufficientSubscription { required, current } => {
        Self::ForbiddenTier { required, current }
      }
      E::ResetTokenMismatch => Self::BadRequest("invalid reset token".to_owned()),
      E::Serialization(e) => Self::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = self.to_string();
    match self {
      ApiError::Unauthenticated => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"scholar\""),
        );
        res
      }
      ApiError::ForbiddenRole { required } => (
        StatusCode::FORBIDDEN,
        Json(json!({
          "error": message,
          "reason": "role_required",
          "requiredRole": required,
        })),
      )
        .into_response(),
      ApiError::ForbiddenTier { required, current } => (
        StatusCode::FORBIDDEN,
        Json(json!({
          "error": message,
          "reason": "tier_required",
          "requiredTier": required,
          "currentTier": current,
        })),
      )
        .into_response(),
      ApiError::NotFound(_) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
      }
      ApiError::Conflict(_) => {
        (StatusCode::CONFLICT, Json(json!({ "error": message }))).into_response()
      }
      ApiError::BadRequest(_) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
      }
      ApiError::Upstream(_) => {
        tracing::error!(error = %message, "identity provider call failed");
        (StatusCode::BAD_GATEWAY, Json(json!({ "error": message }))).into_response()
      }
      ApiError::Store(_) => {
        tracing::error!(error = %message, "store request failed");
        (
          StatusCode::SERVICE_UNAVAILABLE,
          Json(json!({ "error": "storage temporarily unavailable; please retry" })),
        )
          .into_response()
      }
      ApiError::Internal(_) => {
        tracing::error!(error = %message, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message })))
          .into_response()
      }
    }
  }
}
