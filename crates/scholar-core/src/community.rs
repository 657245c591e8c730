//! Community feed posts, comments and likes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id:          String,
  pub author_id:   String,
  pub author_name: String,
  pub content:     String,
  pub created_at:  DateTime<Utc>,
}

/// A feed post (`post:<id>`). Comments and likes live inside the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub id:          String,
  pub author_id:   String,
  pub author_name: String,
  pub content:     String,
  pub created_at:  DateTime<Utc>,
  /// Ids of users who liked the post; each at most once.
  #[serde(default)]
  pub likes:       Vec<String>,
  #[serde(default)]
  pub comments:    Vec<Comment>,
}

impl Post {
  pub fn new(
    author_id: impl Into<String>,
    author_name: impl Into<String>,
    content: impl Into<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id:          Uuid::new_v4().to_string(),
      author_id:   author_id.into(),
      author_name: author_name.into(),
      content:     content.into(),
      created_at:  now,
      likes:       Vec::new(),
      comments:    Vec::new(),
    }
  }

  pub fn add_comment(
    &mut self,
    author_id: impl Into<String>,
    author_name: impl Into<String>,
    content: impl Into<String>,
    now: DateTime<Utc>,
  ) -> &Comment {
    self.comments.push(Comment {
      id:          Uuid::new_v4().to_string(),
      author_id:   author_id.into(),
      author_name: author_name.into(),
      content:     content.into(),
      created_at:  now,
    });
    &self.comments[self.comments.len() - 1]
  }

  /// Like or unlike. Returns `true` if the user now likes the post.
  pub fn toggle_like(&mut self, user_id: &str) -> bool {
    if let Some(i) = self.likes.iter().position(|u| u == user_id) {
      self.likes.remove(i);
      false
    } else {
      self.likes.push(user_id.to_owned());
      true
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn likes_toggle() {
    let now = Utc.timestamp_opt(0, 0).unwrap();
    let mut post = Post::new("a", "Ada", "hello", now);
    assert!(post.toggle_like("b"));
    assert!(post.toggle_like("c"));
    assert!(!post.toggle_like("b"));
    assert_eq!(post.likes, vec!["c"]);
  }

  #[test]
  fn comments_append() {
    let now = Utc.timestamp_opt(0, 0).unwrap();
    let mut post = Post::new("a", "Ada", "hello", now);
    let id = post.add_comment("b", "Bob", "hi!", now).id.clone();
    assert_eq!(post.comments.len(), 1);
    assert_eq!(post.comments[0].id, id);
  }
}
