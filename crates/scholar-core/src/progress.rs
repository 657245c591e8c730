//! Enrollment and per-lesson progress bookkeeping.
//!
//! Every operation takes the profile and course it needs and mutates the
//! profile in place. The caller is responsible for writing the profile back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  course::Course,
  profile::UserProfile,
  reward::{self, Reward},
};

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedLesson {
  pub lesson_id:    String,
  pub completed_at: DateTime<Utc>,
  pub xp_earned:    u32,
}

/// A user's participation in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
  pub course_id:         String,
  pub enrolled_at:       DateTime<Utc>,
  /// 0–100; only ever recomputed from `completed_lessons`.
  #[serde(default)]
  pub progress:          u8,
  /// Append-only; each `lesson_id` appears once.
  #[serde(default)]
  pub completed_lessons: Vec<CompletedLesson>,
  pub last_accessed_at:  DateTime<Utc>,
}

impl Enrollment {
  pub fn new(course_id: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      course_id:         course_id.into(),
      enrolled_at:       now,
      progress:          0,
      completed_lessons: Vec::new(),
      last_accessed_at:  now,
    }
  }

  pub fn has_completed(&self, lesson_id: &str) -> bool {
    self.completed_lessons.iter().any(|c| c.lesson_id == lesson_id)
  }
}

/// `round(100 * completed / total)`, capped at 100. An empty course is 0%.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
  if total == 0 {
    return 0;
  }
  let pct = (completed as f64 / total as f64 * 100.0).round();
  pct.min(100.0) as u8
}

// ─── Operations ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollOutcome {
  pub enrollment: Enrollment,
  pub xp_gained:  u64,
}

/// Enroll `profile` in `course_id`.
///
/// Checked in order: already enrolled, course exists (`course` is the catalog
/// lookup result), tier sufficient. On success the enrollment bonus is
/// awarded.
pub fn enroll(
  profile: &mut UserProfile,
  course_id: &str,
  course: Option<&Course>,
  now: DateTime<Utc>,
) -> Result<EnrollOutcome> {
  if profile.is_enrolled(course_id) {
    return Err(Error::AlreadyEnrolled(course_id.to_owned()));
  }
  let course = course.ok_or_else(|| Error::CourseNotFound(course_id.to_owned()))?;
  if let Some(required) = course.required_tier
    && profile.subscription_tier < required
  {
    return Err(Error::InsufficientSubscription {
      required,
      current: profile.subscription_tier,
    });
  }

  let enrollment = Enrollment::new(course_id, now);
  profile.enrollments.push(enrollment.clone());
  let xp_gained = reward::award(profile, Reward::Enrollment, now.date_naive());

  Ok(EnrollOutcome {
    enrollment,
    xp_gained,
  })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
  pub enrollment:        Enrollment,
  pub xp_gained:         u64,
  pub already_completed: bool,
  /// `true` the first time progress reaches 100%.
  pub course_completed:  bool,
}

/// Record that `lesson_id` of `course` was finished.
///
/// Reporting the same lesson again is a successful no-op: nothing is appended
/// and no XP is awarded.
pub fn record_lesson_completion(
  profile: &mut UserProfile,
  course: &Course,
  lesson_id: &str,
  xp_gained: u32,
  now: DateTime<Utc>,
) -> Result<CompletionOutcome> {
  let Some(enrollment) = profile.enrollment(&course.id) else {
    return Err(Error::NotEnrolled(course.id.clone()));
  };
  if enrollment.has_completed(lesson_id) {
    return Ok(CompletionOutcome {
      enrollment:        enrollment.clone(),
      xp_gained:         0,
      already_completed: true,
      course_completed:  false,
    });
  }
  if !course.has_lesson(lesson_id) {
    return Err(Error::LessonNotFound {
      course_id: course.id.clone(),
      lesson_id: lesson_id.to_owned(),
    });
  }

  let total = course.lesson_count();
  let enrollment = profile
    .enrollment_mut(&course.id)
    .ok_or_else(|| Error::NotEnrolled(course.id.clone()))?;
  enrollment.completed_lessons.push(CompletedLesson {
    lesson_id: lesson_id.to_owned(),
    completed_at: now,
    xp_earned: xp_gained,
  });
  enrollment.progress = progress_percent(enrollment.completed_lessons.len(), total);
  enrollment.last_accessed_at = now;
  let snapshot = enrollment.clone();

  let course_completed =
    snapshot.progress >= 100 && !profile.completed_courses.contains(&course.id);
  if course_completed {
    profile.completed_courses.push(course.id.clone());
  }

  let xp = reward::award(
    profile,
    Reward::LessonCompletion(xp_gained),
    now.date_naive(),
  );

  Ok(CompletionOutcome {
    enrollment: snapshot,
    xp_gained: xp,
    already_completed: false,
    course_completed,
  })
}

// ─── Reading gate ────────────────────────────────────────────────────────────

/// Fraction of a lesson that must be scrolled past before it can be marked
/// complete.
pub const READ_THRESHOLD: f64 = 0.8;

/// Scroll state of the lesson reader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
  pub scroll_top:    f64,
  pub scroll_height: f64,
  pub client_height: f64,
}

impl ScrollMetrics {
  /// `scroll_top / (scroll_height - client_height)` in `[0, 1]`. Content that
  /// fits without scrolling counts as fully read.
  pub fn read_fraction(&self) -> f64 {
    let scrollable = self.scroll_height - self.client_height;
    if scrollable <= 0.0 {
      return 1.0;
    }
    (self.scroll_top / scrollable).clamp(0.0, 1.0)
  }
}

/// Whether the reader may submit completion. Re-submitting a finished lesson
/// is a review and always allowed.
pub fn may_complete(scroll: ScrollMetrics, already_completed: bool) -> bool {
  already_completed || scroll.read_fraction() >= READ_THRESHOLD
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;
  use crate::profile::{Identity, Tier};

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() }

  fn learner() -> UserProfile {
    UserProfile::from_identity(
      &Identity {
        user_id: "u-1".into(),
        email:   "learner@example.com".into(),
        name:    Some("Learner".into()),
        role:    None,
      },
      now(),
    )
  }

  fn intro_ai() -> Course {
    serde_json::from_value(json!({
      "id": "intro-ai",
      "title": "Intro to AI",
      "type": "mock",
      "requiredTier": "free",
      "lessons": [
        { "id": "intro-1", "title": "What is AI?" },
        { "id": "intro-2", "title": "History" },
        { "id": "intro-3", "title": "Search" },
        { "id": "intro-4", "title": "Learning" }
      ]
    }))
    .unwrap()
  }

  fn pro_course() -> Course {
    let mut c = intro_ai();
    c.id = "applied-ml".into();
    c.required_tier = Some(Tier::Pro);
    c
  }

  #[test]
  fn enroll_then_complete_scenario() {
    let mut user = learner();
    let course = intro_ai();

    let out = enroll(&mut user, "intro-ai", Some(&course), now()).unwrap();
    assert_eq!(out.xp_gained, 50);
    assert_eq!(out.enrollment.progress, 0);
    assert_eq!(user.xp, 50);
    assert_eq!(user.daily_xp, 50);

    let done = record_lesson_completion(&mut user, &course, "intro-1", 100, now()).unwrap();
    assert!(!done.already_completed);
    assert_eq!(done.enrollment.progress, 25);
    assert_eq!(done.enrollment.completed_lessons.len(), 1);
    assert_eq!(done.enrollment.completed_lessons[0].lesson_id, "intro-1");
    assert_eq!(user.xp, 150);
  }

  #[test]
  fn duplicate_enrollment_is_rejected_without_xp() {
    let mut user = learner();
    let course = intro_ai();
    enroll(&mut user, "intro-ai", Some(&course), now()).unwrap();

    let err = enroll(&mut user, "intro-ai", Some(&course), now()).unwrap_err();
    assert!(matches!(err, Error::AlreadyEnrolled(_)));
    assert_eq!(user.enrollments.len(), 1);
    assert_eq!(user.xp, 50);
  }

  #[test]
  fn already_enrolled_is_checked_before_existence() {
    let mut user = learner();
    enroll(&mut user, "intro-ai", Some(&intro_ai()), now()).unwrap();
    let err = enroll(&mut user, "intro-ai", None, now()).unwrap_err();
    assert!(matches!(err, Error::AlreadyEnrolled(_)));
  }

  #[test]
  fn unknown_course_is_not_found() {
    let mut user = learner();
    let err = enroll(&mut user, "nope", None, now()).unwrap_err();
    assert!(matches!(err, Error::CourseNotFound(_)));
    assert!(user.enrollments.is_empty());
  }

  #[test]
  fn tier_gate_blocks_free_user() {
    let mut user = learner();
    let err = enroll(&mut user, "applied-ml", Some(&pro_course()), now()).unwrap_err();
    assert!(matches!(
      err,
      Error::InsufficientSubscription { required: Tier::Pro, current: Tier::Free }
    ));
    assert!(user.enrollments.is_empty());
    assert_eq!(user.xp, 0);

    user.subscription_tier = Tier::Enterprise;
    assert!(enroll(&mut user, "applied-ml", Some(&pro_course()), now()).is_ok());
  }

  #[test]
  fn repeated_completion_never_double_counts() {
    let mut user = learner();
    let course = intro_ai();
    enroll(&mut user, "intro-ai", Some(&course), now()).unwrap();
    record_lesson_completion(&mut user, &course, "intro-2", 120, now()).unwrap();
    let xp_after_first = user.xp;

    let again = record_lesson_completion(&mut user, &course, "intro-2", 120, now()).unwrap();
    assert!(again.already_completed);
    assert_eq!(again.xp_gained, 0);
    assert_eq!(again.enrollment.completed_lessons.len(), 1);
    assert_eq!(user.xp, xp_after_first);
  }

  #[test]
  fn completion_requires_enrollment() {
    let mut user = learner();
    let err = record_lesson_completion(&mut user, &intro_ai(), "intro-1", 100, now())
      .unwrap_err();
    assert!(matches!(err, Error::NotEnrolled(_)));
  }

  #[test]
  fn completion_of_unknown_lesson_is_rejected() {
    let mut user = learner();
    let course = intro_ai();
    enroll(&mut user, "intro-ai", Some(&course), now()).unwrap();
    let err = record_lesson_completion(&mut user, &course, "ghost", 100, now()).unwrap_err();
    assert!(matches!(err, Error::LessonNotFound { .. }));
    assert_eq!(user.xp, 50);
  }

  #[test]
  fn finishing_every_lesson_completes_course_once() {
    let mut user = learner();
    let course = intro_ai();
    enroll(&mut user, "intro-ai", Some(&course), now()).unwrap();

    let mut last = None;
    for id in course.lesson_ids() {
      last = Some(record_lesson_completion(&mut user, &course, &id, 75, now()).unwrap());
    }
    let last = last.unwrap();
    assert!(last.course_completed);
    assert_eq!(last.enrollment.progress, 100);
    assert_eq!(user.completed_courses, vec!["intro-ai"]);
    assert_eq!(user.xp, 50 + 4 * 75);
  }

  #[test]
  fn progress_uses_real_lesson_count() {
    assert_eq!(progress_percent(1, 3), 33);
    assert_eq!(progress_percent(2, 3), 67);
    assert_eq!(progress_percent(1, 8), 13);
    assert_eq!(progress_percent(0, 0), 0);
    assert_eq!(progress_percent(5, 4), 100);
  }

  #[test]
  fn reading_gate() {
    let half = ScrollMetrics { scroll_top: 500.0, scroll_height: 1500.0, client_height: 500.0 };
    let most = ScrollMetrics { scroll_top: 800.0, ..half };
    let short = ScrollMetrics { scroll_top: 0.0, scroll_height: 300.0, client_height: 500.0 };

    assert!(!may_complete(half, false));
    assert!(may_complete(half, true));
    assert!(may_complete(most, false));
    assert!(may_complete(short, false));
  }
}
