use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The server answered with a non-success status.
  #[error("{method} {path} → {status}: {message}")]
  Status {
    method:  &'static str,
    path:    String,
    status:  u16,
    message: String,
  },
}

impl ClientError {
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      Self::Http(e) => e.status().map(|s| s.as_u16()),
    }
  }

  pub fn is_not_found(&self) -> bool { self.status() == Some(404) }

  pub fn is_conflict(&self) -> bool { self.status() == Some(409) }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
