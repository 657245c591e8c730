//! Courses and the flat lesson records they persist.
//!
//! Stored course documents predate the graph editor, so most lesson fields
//! are optional here. [`crate::graph::LessonGraph::load`] is the single place
//! that fills them in.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use crate::{profile::Tier, store::keys};

// ─── Lesson type ─────────────────────────────────────────────────────────────

/// The kind of activity a lesson represents.
///
/// Unknown strings read from storage become [`LessonType::Reading`] instead of
/// failing the whole lesson.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase", from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum LessonType {
  #[default]
  Reading,
  Practice,
  Project,
  Quiz,
  Video,
  Checkpoint,
}

impl From<String> for LessonType {
  fn from(s: String) -> Self { s.parse().unwrap_or_default() }
}

// ─── Position ────────────────────────────────────────────────────────────────

/// A point on the course map, each axis a percentage of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

// ─── Lesson record ───────────────────────────────────────────────────────────

/// The persisted, flattened form of a lesson node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
  pub id:             String,
  #[serde(default)]
  pub title:          String,
  #[serde(default)]
  pub description:    String,
  #[serde(default, rename = "type")]
  pub kind:           LessonType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub video_url:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pdf_url:        Option<String>,
  #[serde(default, alias = "xpReward")]
  pub xp:             u32,
  #[serde(default)]
  pub estimated_time: String,
  /// Minutes; parsed from `estimated_time` when written by the editor.
  #[serde(default)]
  pub duration:       Option<u32>,
  #[serde(default)]
  pub order:          Option<i64>,
  #[serde(default)]
  pub position:       Option<Position>,
  #[serde(default)]
  pub connections:    Option<Vec<String>>,
  #[serde(default)]
  pub prerequisites:  Option<Vec<String>>,
}

impl LessonRecord {
  /// A minimal record with only an id and title, as older documents store.
  pub fn bare(id: impl Into<String>, title: impl Into<String>) -> Self {
    Self {
      id:             id.into(),
      title:          title.into(),
      description:    String::new(),
      kind:           LessonType::default(),
      content:        None,
      video_url:      None,
      pdf_url:        None,
      xp:             0,
      estimated_time: String::new(),
      duration:       None,
      order:          None,
      position:       None,
      connections:    None,
      prerequisites:  None,
    }
  }
}

// ─── Course ──────────────────────────────────────────────────────────────────

/// Where a course came from; decides its storage namespace.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CourseKind {
  /// Seeded catalog content.
  Mock,
  /// Authored by an administrator.
  #[default]
  Custom,
  CrashCourse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
  Draft,
  #[default]
  Published,
  Archived,
}

/// A full course document. Saves replace the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id:            String,
  pub title:         String,
  #[serde(default)]
  pub description:   String,
  #[serde(default = "default_difficulty")]
  pub difficulty:    String,
  #[serde(default)]
  pub course_code:   Option<String>,
  #[serde(default)]
  pub status:        CourseStatus,
  #[serde(default, rename = "type")]
  pub kind:          CourseKind,
  #[serde(default, deserialize_with = "lenient_lessons")]
  pub lessons:       Vec<LessonRecord>,
  #[serde(default)]
  pub required_tier: Option<Tier>,
}

fn default_difficulty() -> String { "beginner".to_owned() }

impl Course {
  pub fn storage_key(&self) -> String {
    match self.kind {
      CourseKind::Mock => keys::mock_course(&self.id),
      CourseKind::Custom | CourseKind::CrashCourse => keys::course(&self.id),
    }
  }

  /// Distinct non-empty lesson ids.
  pub fn lesson_count(&self) -> usize {
    self
      .lessons
      .iter()
      .filter(|l| !l.id.is_empty())
      .map(|l| l.id.as_str())
      .collect::<HashSet<_>>()
      .len()
  }

  /// The first lesson id that is empty or repeats an earlier one.
  pub fn invalid_lesson_id(&self) -> Option<&str> {
    let mut seen = HashSet::new();
    self
      .lessons
      .iter()
      .map(|l| l.id.as_str())
      .find(|id| id.trim().is_empty() || !seen.insert(*id))
  }

  pub fn has_lesson(&self, lesson_id: &str) -> bool {
    self.lessons.iter().any(|l| l.id == lesson_id)
  }

  pub fn lesson_ids(&self) -> Vec<String> {
    self.lessons.iter().map(|l| l.id.clone()).collect()
  }
}

/// Accept anything for `lessons`: a non-array becomes empty and unreadable
/// entries are skipped.
fn lenient_lessons<'de, D>(deserializer: D) -> Result<Vec<LessonRecord>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  Ok(lessons_from_value(&value))
}

/// Read a lesson list out of an arbitrary JSON value.
pub fn lessons_from_value(value: &serde_json::Value) -> Vec<LessonRecord> {
  match value {
    serde_json::Value::Array(items) => items
      .iter()
      .filter_map(|item| serde_json::from_value(item.clone()).ok())
      .collect(),
    _ => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn non_array_lessons_become_empty() {
    let course: Course = serde_json::from_value(json!({
      "id": "c1",
      "title": "Broken",
      "lessons": { "not": "an array" }
    }))
    .unwrap();
    assert!(course.lessons.is_empty());
    assert_eq!(course.kind, CourseKind::Custom);
    assert_eq!(course.status, CourseStatus::Published);
  }

  #[test]
  fn unreadable_lessons_are_skipped() {
    let course: Course = serde_json::from_value(json!({
      "id": "c1",
      "title": "Mixed",
      "lessons": [
        { "id": "a", "title": "A" },
        42,
        { "title": "no id" },
        { "id": "b", "type": "hologram", "xpReward": 120 }
      ]
    }))
    .unwrap();
    assert_eq!(course.lesson_ids(), vec!["a", "b"]);
    assert_eq!(course.lessons[1].kind, LessonType::Reading);
    assert_eq!(course.lessons[1].xp, 120);
  }

  #[test]
  fn repeated_lesson_ids_count_once() {
    let course: Course = serde_json::from_value(json!({
      "id": "c1",
      "title": "Dupes",
      "lessons": [{ "id": "a" }, { "id": "a" }, { "id": "" }, { "id": "b" }]
    }))
    .unwrap();
    assert_eq!(course.lesson_count(), 2);
    assert_eq!(course.invalid_lesson_id(), Some("a"));

    let clean: Course = serde_json::from_value(json!({
      "id": "c2",
      "title": "Clean",
      "lessons": [{ "id": "a" }, { "id": "b" }]
    }))
    .unwrap();
    assert_eq!(clean.invalid_lesson_id(), None);
  }

  #[test]
  fn storage_key_follows_kind() {
    let mut course: Course =
      serde_json::from_value(json!({ "id": "intro-ai", "title": "Intro", "type": "mock" }))
        .unwrap();
    assert_eq!(course.storage_key(), "mock_course:intro-ai");
    course.kind = CourseKind::CrashCourse;
    assert_eq!(course.storage_key(), "course:intro-ai");
    assert_eq!(
      serde_json::to_value(course.kind).unwrap(),
      json!("crash-course")
    );
  }
}
