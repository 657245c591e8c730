//! Conversion between the editing graph and the stored lesson list, and the
//! save-then-verify round trip.

use std::{collections::BTreeSet, future::Future};

use thiserror::Error;

use crate::{
  course::{Course, LessonRecord},
  graph::{LessonGraph, LessonNode},
};

/// Minutes assumed when `estimated_time` has no leading number.
pub const DEFAULT_DURATION_MINUTES: u32 = 15;

/// The leading integer of a free-text duration label (`"45 min"` → 45).
pub fn parse_duration(estimated_time: &str) -> u32 {
  let digits: String = estimated_time
    .trim_start()
    .chars()
    .take_while(char::is_ascii_digit)
    .collect();
  digits.parse().unwrap_or(DEFAULT_DURATION_MINUTES)
}

fn to_record(node: &LessonNode) -> LessonRecord {
  LessonRecord {
    id:             node.id.clone(),
    title:          node.title.clone(),
    description:    node.description.clone(),
    kind:           node.kind,
    content:        node.content.clone(),
    video_url:      node.video_url.clone(),
    pdf_url:        node.pdf_url.clone(),
    xp:             node.xp_reward,
    estimated_time: node.estimated_time.clone(),
    duration:       Some(parse_duration(&node.estimated_time)),
    order:          Some(node.order),
    position:       Some(node.position),
    connections:    Some(node.connections.clone()),
    prerequisites:  Some(node.prerequisites.clone()),
  }
}

/// Flatten nodes into storage records, ordered by each node's `order`.
/// Equal orders keep their array order.
pub fn flatten(nodes: &[LessonNode]) -> Vec<LessonRecord> {
  let mut records: Vec<LessonRecord> = nodes.iter().map(to_record).collect();
  records.sort_by_key(|r| r.order);
  records
}

/// `course` with its lessons replaced by the flattened `graph`.
pub fn course_with_graph(course: &Course, graph: &LessonGraph) -> Course {
  Course {
    lessons: flatten(graph.nodes()),
    ..course.clone()
  }
}

// ─── Save round trip ─────────────────────────────────────────────────────────

/// Where courses are written and read back from.
pub trait CourseTransport: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Replace the whole stored document for `course.id`.
  fn put_course<'a>(
    &'a self,
    course: &'a Course,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Read back a stored course. `None` if absent.
  fn fetch_course<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + 'a;
}

/// Result of comparing the saved document against what was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
  /// Same lesson count and id set.
  Verified,
  Mismatch {
    expected: Vec<String>,
    found:    Vec<String>,
  },
  /// The re-fetch failed or returned nothing; the save itself stands.
  Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub struct SaveReport {
  /// The document that was written.
  pub course:       Course,
  pub verification: Verification,
}

#[derive(Debug, Error)]
pub enum SaveError<E: std::error::Error + 'static> {
  #[error("failed to save course: {0}")]
  Transport(#[source] E),
}

/// Flatten `graph`, write the full course, then read it back to check the
/// lesson ids arrived. `graph` is never modified, so a failed save can be
/// retried as-is.
pub async fn save<T: CourseTransport>(
  transport: &T,
  course: &Course,
  graph: &LessonGraph,
) -> Result<SaveReport, SaveError<T::Error>> {
  let outgoing = course_with_graph(course, graph);
  transport
    .put_course(&outgoing)
    .await
    .map_err(SaveError::Transport)?;

  let verification = match transport.fetch_course(&outgoing.id).await {
    Ok(Some(stored)) => verify(&outgoing, &stored),
    Ok(None) => Verification::Skipped {
      reason: "saved course not found on re-fetch".to_owned(),
    },
    Err(e) => Verification::Skipped {
      reason: e.to_string(),
    },
  };

  Ok(SaveReport {
    course: outgoing,
    verification,
  })
}

/// Compare lesson count and id set; order may differ.
pub fn verify(sent: &Course, stored: &Course) -> Verification {
  let expected = sent.lesson_ids();
  let found = stored.lesson_ids();
  let same_ids = expected.iter().collect::<BTreeSet<_>>()
    == found.iter().collect::<BTreeSet<_>>();
  if expected.len() == found.len() && same_ids {
    Verification::Verified
  } else {
    Verification::Mismatch { expected, found }
  }
}
