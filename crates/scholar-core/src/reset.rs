//! Password-reset token records (`password_reset:<email>`).
//!
//! Only a digest of the token is stored. Hashing happens in the caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default lifetime of a reset token, in minutes.
pub const DEFAULT_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
  pub token_hash: String,
  pub expires_at: DateTime<Utc>,
  pub used:       bool,
}

impl PasswordReset {
  pub fn issue(token_hash: String, now: DateTime<Utc>, ttl: Duration) -> Self {
    Self {
      token_hash,
      expires_at: now + ttl,
      used: false,
    }
  }

  /// Check `token_hash` against this record and mark it used.
  ///
  /// The hash is checked first, so a wrong token learns nothing about whether
  /// the record is used or expired.
  pub fn redeem(&mut self, token_hash: &str, now: DateTime<Utc>) -> Result<()> {
    if !digests_match(&self.token_hash, token_hash) {
      return Err(Error::ResetTokenMismatch);
    }
    if self.used {
      return Err(Error::ResetTokenUsed);
    }
    if now >= self.expires_at {
      return Err(Error::ResetTokenExpired);
    }
    self.used = true;
    Ok(())
  }
}

/// Compare two hex digests without short-circuiting on the first difference.
/// Case-insensitive.
pub fn digests_match(a: &str, b: &str) -> bool {
  if a.len() != b.len() {
    return false;
  }
  a.bytes()
    .zip(b.bytes())
    .fold(0u8, |acc, (x, y)| acc | (x.to_ascii_lowercase() ^ y.to_ascii_lowercase()))
    == 0
}
