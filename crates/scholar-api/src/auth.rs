//! Bearer-token authentication and the identity provider seam.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use scholar_core::{
  profile::{Identity, Role, UserProfile},
  reset,
  store::KvStore,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{AppState, docs, error::ApiError};

// ─── Provider seam ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// The hosted identity service: token verification, credential changes and
/// out-of-band delivery of reset tokens.
pub trait IdentityProvider: Send + Sync {
  /// Resolve a bearer token to the caller it was issued to.
  fn verify_token(&self, token: &str) -> Option<Identity>;

  /// Replace the password of the account registered under `email`.
  fn reset_password(&self, email: &str, new_password: &str) -> Result<(), ProviderError>;

  /// Hand a freshly issued reset token to the account owner.
  fn deliver_reset_token(&self, email: &str, token: &str);
}

/// SHA-256 of `token`, lowercase hex. Used for bearer tokens and reset tokens.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

// ─── Static provider ─────────────────────────────────────────────────────────

/// One configured account of the [`StaticIdentityProvider`].
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
  /// Hex SHA-256 of the bearer token; see `server --hash-token`.
  pub token_sha256: String,
  pub user_id:      String,
  pub email:        String,
  #[serde(default)]
  pub name:         Option<String>,
  #[serde(default)]
  pub role:         Option<Role>,
}

/// A provider backed by the `tokens` list in the server configuration.
///
/// It owns no passwords: resets are acknowledged and logged, and reset tokens
/// are written to the log at debug level for local development.
pub struct StaticIdentityProvider {
  entries: Vec<TokenEntry>,
}

impl StaticIdentityProvider {
  pub fn new(entries: Vec<TokenEntry>) -> Self {
    Self { entries }
  }
}

impl IdentityProvider for StaticIdentityProvider {
  fn verify_token(&self, token: &str) -> Option<Identity> {
    let digest = hash_token(token);
    self
      .entries
      .iter()
      .find(|e| reset::digests_match(&e.token_sha256, &digest))
      .map(|e| Identity {
        user_id: e.user_id.clone(),
        email:   e.email.clone(),
        name:    e.name.clone(),
        role:    e.role,
      })
  }

  fn reset_password(&self, email: &str, _new_password: &str) -> Result<(), ProviderError> {
    tracing::info!(%email, "password reset acknowledged by static identity provider");
    Ok(())
  }

  fn deliver_reset_token(&self, email: &str, token: &str) {
    tracing::debug!(%email, %token, "password reset token issued");
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

fn bearer(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// The verified identity behind the request. No store access.
pub struct Caller(pub Identity);

impl<S> FromRequestParts<AppState<S>> for Caller
where
  S: KvStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer(&parts.headers).ok_or(ApiError::Unauthenticated)?;
    match state.identity.verify_token(token) {
      Some(identity) => Ok(Caller(identity)),
      None => {
        tracing::warn!("rejected bearer token");
        Err(ApiError::Unauthenticated)
      }
    }
  }
}

/// The caller together with their profile, created on first sight.
///
/// The profile is a snapshot; handlers that write it reload under the user's
/// lock first.
pub struct CurrentUser {
  pub identity: Identity,
  pub profile:  UserProfile,
}

impl CurrentUser {
  pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
    if self.profile.role == Role::Admin || allowed.contains(&self.profile.role) {
      Ok(())
    } else {
      Err(ApiError::ForbiddenRole {
        required: allowed.first().copied().unwrap_or(Role::Admin),
      })
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: KvStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Caller(identity) = Caller::from_request_parts(parts, state).await?;
    let profile = docs::ensure_profile(state, &identity).await?;
    Ok(CurrentUser { identity, profile })
  }
}

/// A [`CurrentUser`] whose profile carries the admin role.
pub struct AdminUser(pub CurrentUser);

impl<S> FromRequestParts<AppState<S>> for AdminUser
where
  S: KvStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = CurrentUser::from_request_parts(parts, state).await?;
    if user.profile.role != Role::Admin {
      return Err(ApiError::ForbiddenRole { required: Role::Admin });
    }
    Ok(AdminUser(user))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn provider() -> StaticIdentityProvider {
    StaticIdentityProvider::new(vec![TokenEntry {
      token_sha256: hash_token("s3cret"),
      user_id:      "u1".into(),
      email:        "ana@example.com".into(),
      name:         Some("Ana".into()),
      role:         Some(Role::Teacher),
    }])
  }

  #[test]
  fn known_token_resolves_identity() {
    let id = provider().verify_token("s3cret").unwrap();
    assert_eq!(id.user_id, "u1");
    assert_eq!(id.role, Some(Role::Teacher));
  }

  #[test]
  fn unknown_token_is_rejected() {
    assert!(provider().verify_token("guess").is_none());
    assert!(provider().verify_token("").is_none());
  }

  #[test]
  fn digest_comparison_ignores_hex_case() {
    let p = StaticIdentityProvider::new(vec![TokenEntry {
      token_sha256: hash_token("abc").to_uppercase(),
      user_id:      "u2".into(),
      email:        "b@example.com".into(),
      name:         None,
      role:         None,
    }]);
    assert!(p.verify_token("abc").is_some());
  }

  #[test]
  fn bearer_header_parsing() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
    assert_eq!(bearer(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert_eq!(bearer(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
    assert_eq!(bearer(&headers), Some("tok"));
  }

  #[test]
  fn hash_is_sha256_hex() {
    assert_eq!(
      hash_token("abc"),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }
}
