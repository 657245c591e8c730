//! The built-in course catalog, written once at startup.

use scholar_core::{
  course::{Course, CourseKind, CourseStatus, LessonRecord, LessonType},
  profile::Tier,
  store::{KvStore, keys},
};

use crate::{docs, error::ApiError};

struct SeedLesson {
  id:      &'static str,
  title:   &'static str,
  kind:    LessonType,
  xp:      u32,
  minutes: u32,
}

const fn lesson(
  id: &'static str,
  title: &'static str,
  kind: LessonType,
  xp: u32,
  minutes: u32,
) -> SeedLesson {
  SeedLesson { id, title, kind, xp, minutes }
}

struct SeedCourse {
  id:          &'static str,
  title:       &'static str,
  description: &'static str,
  difficulty:  &'static str,
  kind:        CourseKind,
  tier:        Option<Tier>,
  lessons:     &'static [SeedLesson],
}

const CATALOG: &[SeedCourse] = &[
  SeedCourse {
    id:          "intro-ai",
    title:       "Introduction to Artificial Intelligence",
    description: "What AI is, where it came from and how it is used today.",
    difficulty:  "beginner",
    kind:        CourseKind::Mock,
    tier:        None,
    lessons:     &[
      lesson("intro-ai-1", "What is AI?", LessonType::Reading, 100, 10),
      lesson("intro-ai-2", "A short history", LessonType::Video, 100, 15),
      lesson("intro-ai-3", "AI around you", LessonType::Practice, 150, 20),
      lesson("intro-ai-4", "Check your understanding", LessonType::Quiz, 200, 10),
    ],
  },
  SeedCourse {
    id:          "applied-ml",
    title:       "Applied Machine Learning",
    description: "Train, evaluate and ship your first models.",
    difficulty:  "intermediate",
    kind:        CourseKind::Mock,
    tier:        Some(Tier::Pro),
    lessons:     &[
      lesson("applied-ml-1", "Framing a learning problem", LessonType::Reading, 100, 15),
      lesson("applied-ml-2", "Preparing data", LessonType::Practice, 150, 30),
      lesson("applied-ml-3", "Training a first model", LessonType::Video, 150, 25),
      lesson("applied-ml-4", "Evaluation and metrics", LessonType::Quiz, 200, 15),
      lesson("applied-ml-5", "Capstone: an end-to-end model", LessonType::Project, 400, 90),
    ],
  },
  SeedCourse {
    id:          "ai-leadership",
    title:       "AI for Leaders",
    description: "A crash course on planning and governing AI initiatives.",
    difficulty:  "advanced",
    kind:        CourseKind::CrashCourse,
    tier:        Some(Tier::Enterprise),
    lessons:     &[
      lesson("ai-leadership-1", "Strategy and opportunity", LessonType::Reading, 150, 20),
      lesson("ai-leadership-2", "Risk and governance", LessonType::Video, 150, 20),
      lesson("ai-leadership-3", "Leadership checkpoint", LessonType::Checkpoint, 300, 15),
    ],
  },
];

/// The catalog as course documents, in a straight chain on the map.
pub fn catalog() -> Vec<Course> {
  CATALOG
    .iter()
    .map(|c| Course {
      id:            c.id.to_owned(),
      title:         c.title.to_owned(),
      description:   c.description.to_owned(),
      difficulty:    c.difficulty.to_owned(),
      course_code:   None,
      status:        CourseStatus::Published,
      kind:          c.kind,
      lessons:       c
        .lessons
        .iter()
        .enumerate()
        .map(|(i, l)| LessonRecord {
          kind:           l.kind,
          xp:             l.xp,
          estimated_time: format!("{} min", l.minutes),
          duration:       Some(l.minutes),
          order:          Some(i as i64),
          ..LessonRecord::bare(l.id, l.title)
        })
        .collect(),
      required_tier: c.tier,
    })
    .collect()
}

/// Write every catalog course that has never been seeded. Returns how many
/// were written.
///
/// Each course gets a `seeded:<id>` marker, so a course an admin deleted or
/// moved stays that way across restarts. A course already stored under either
/// namespace is only marked.
pub async fn seed_catalog<S: KvStore>(store: &S) -> Result<usize, ApiError> {
  let mut written = 0;
  for course in catalog() {
    let marker = keys::seeded(&course.id);
    if store.get(&marker).await.map_err(ApiError::store)?.is_some() {
      continue;
    }
    if docs::find_course(store, &course.id).await?.is_none() {
      docs::put_doc(store, &course.storage_key(), &course).await?;
      written += 1;
    }
    docs::put_doc(store, &marker, &chrono::Utc::now()).await?;
  }
  if written > 0 {
    tracing::info!(written, "seeded course catalog");
  }
  Ok(written)
}
