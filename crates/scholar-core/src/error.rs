//! Error types for `scholar-core`.

use thiserror::Error;

use crate::profile::Tier;

#[derive(Debug, Error)]
pub enum Error {
  #[error("already enrolled in course {0}")]
  AlreadyEnrolled(String),

  #[error("not enrolled in course {0}")]
  NotEnrolled(String),

  #[error("course not found: {0}")]
  CourseNotFound(String),

  #[error("lesson {lesson_id} not found in course {course_id}")]
  LessonNotFound {
    course_id: String,
    lesson_id: String,
  },

  #[error("course requires the {required} tier, current tier is {current}")]
  InsufficientSubscription { required: Tier, current: Tier },

  #[error("lesson node not found: {0}")]
  NodeNotFound(String),

  #[error("password reset token already used")]
  ResetTokenUsed,

  #[error("password reset token expired")]
  ResetTokenExpired,

  #[error("password reset token does not match")]
  ResetTokenMismatch,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
