//! Teacher invite codes and class rosters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An invite code a teacher hands out (`invite:<code>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
  pub code:        String,
  pub teacher_id:  String,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub redeemed_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLink {
  pub student_id: String,
  pub joined_at:  DateTime<Utc>,
}

/// A teacher's roster (`teacher_students:<teacherId>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
  pub teacher_id: String,
  #[serde(default)]
  pub students:   Vec<StudentLink>,
}

impl Roster {
  pub fn new(teacher_id: impl Into<String>) -> Self {
    Self {
      teacher_id: teacher_id.into(),
      students:   Vec::new(),
    }
  }

  /// Add `student_id` unless already present. Returns `true` if added.
  pub fn add(&mut self, student_id: &str, now: DateTime<Utc>) -> bool {
    if self.students.iter().any(|s| s.student_id == student_id) {
      return false;
    }
    self.students.push(StudentLink {
      student_id: student_id.to_owned(),
      joined_at:  now,
    });
    true
  }
}

impl Invite {
  /// Note that `student_id` used this code. Returns `false` on repeat use.
  pub fn redeem(&mut self, student_id: &str) -> bool {
    if self.redeemed_by.iter().any(|s| s == student_id) {
      return false;
    }
    self.redeemed_by.push(student_id.to_owned());
    true
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn roster_is_a_set() {
    let now = Utc.timestamp_opt(0, 0).unwrap();
    let mut roster = Roster::new("t");
    assert!(roster.add("s1", now));
    assert!(!roster.add("s1", now));
    assert!(roster.add("s2", now));
    assert_eq!(roster.students.len(), 2);
  }
}
