//! Achievements: a read-only view derived from a profile snapshot.
//!
//! Each definition pairs metadata with a plain predicate over
//! [`UserProfile`]. An achievement counts as unlocked if its predicate holds
//! now, or if its id was persisted in `unlocked_achievements` earlier.

use serde::Serialize;

use crate::profile::{Role, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Learning,
  Progress,
  Streak,
  Community,
  Teaching,
  Career,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
  Common,
  Rare,
  Epic,
  Legendary,
}

pub struct Achievement {
  pub id:          &'static str,
  pub title:       &'static str,
  pub description: &'static str,
  pub category:    Category,
  pub rarity:      Rarity,
  pub xp_reward:   u32,
  pub condition:   fn(&UserProfile) -> bool,
}

const BASE: &[Achievement] = &[
  Achievement {
    id:          "first-steps",
    title:       "First Steps",
    description: "Enroll in your first course",
    category:    Category::Learning,
    rarity:      Rarity::Common,
    xp_reward:   50,
    condition:   |p| !p.enrollments.is_empty(),
  },
  Achievement {
    id:          "first-lesson",
    title:       "Bookworm",
    description: "Complete your first lesson",
    category:    Category::Learning,
    rarity:      Rarity::Common,
    xp_reward:   50,
    condition:   |p| p.lessons_completed() >= 1,
  },
  Achievement {
    id:          "level-5",
    title:       "Rising Star",
    description: "Reach level 5",
    category:    Category::Progress,
    rarity:      Rarity::Rare,
    xp_reward:   200,
    condition:   |p| p.level >= 5,
  },
  Achievement {
    id:          "level-10",
    title:       "Expert",
    description: "Reach level 10",
    category:    Category::Progress,
    rarity:      Rarity::Epic,
    xp_reward:   500,
    condition:   |p| p.level >= 10,
  },
  Achievement {
    id:          "streak-7",
    title:       "On Fire",
    description: "Keep a 7-day learning streak",
    category:    Category::Streak,
    rarity:      Rarity::Rare,
    xp_reward:   150,
    condition:   |p| p.current_streak >= 7,
  },
  Achievement {
    id:          "streak-30",
    title:       "Unstoppable",
    description: "Keep a 30-day learning streak",
    category:    Category::Streak,
    rarity:      Rarity::Legendary,
    xp_reward:   1000,
    condition:   |p| p.current_streak >= 30,
  },
  Achievement {
    id:          "first-post",
    title:       "Voice of the Community",
    description: "Publish your first community post",
    category:    Category::Community,
    rarity:      Rarity::Common,
    xp_reward:   25,
    condition:   |p| p.posts_count >= 1,
  },
];

const STUDENT: &[Achievement] = &[
  Achievement {
    id:          "course-finisher",
    title:       "Graduate",
    description: "Complete a whole course",
    category:    Category::Learning,
    rarity:      Rarity::Rare,
    xp_reward:   300,
    condition:   |p| !p.completed_courses.is_empty(),
  },
  Achievement {
    id:          "explorer",
    title:       "Explorer",
    description: "Enroll in three courses",
    category:    Category::Learning,
    rarity:      Rarity::Common,
    xp_reward:   100,
    condition:   |p| p.enrollments.len() >= 3,
  },
];

const TEACHER: &[Achievement] = &[
  Achievement {
    id:          "lifelong-learner",
    title:       "Lifelong Learner",
    description: "Complete a course to sharpen your teaching",
    category:    Category::Teaching,
    rarity:      Rarity::Rare,
    xp_reward:   300,
    condition:   |p| !p.completed_courses.is_empty(),
  },
  Achievement {
    id:          "discussion-leader",
    title:       "Discussion Leader",
    description: "Publish ten community posts",
    category:    Category::Teaching,
    rarity:      Rarity::Epic,
    xp_reward:   250,
    condition:   |p| p.posts_count >= 10,
  },
];

const PROFESSIONAL: &[Achievement] = &[
  Achievement {
    id:          "upskiller",
    title:       "Upskiller",
    description: "Complete two courses",
    category:    Category::Career,
    rarity:      Rarity::Epic,
    xp_reward:   400,
    condition:   |p| p.completed_courses.len() >= 2,
  },
];

/// Every achievement a `role` can earn: the shared list plus its extension.
pub fn definitions_for(role: Role) -> impl Iterator<Item = &'static Achievement> {
  let extra: &'static [Achievement] = match role {
    Role::Student => STUDENT,
    Role::Teacher => TEACHER,
    Role::Professional => PROFESSIONAL,
    Role::Admin => &[],
  };
  BASE.iter().chain(extra.iter())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
  pub id:          &'static str,
  pub title:       &'static str,
  pub description: &'static str,
  pub category:    Category,
  pub rarity:      Rarity,
  pub xp_reward:   u32,
  pub unlocked:    bool,
}

/// Evaluate every achievement for the profile's role.
pub fn evaluate(profile: &UserProfile) -> Vec<AchievementStatus> {
  definitions_for(profile.role)
    .map(|a| AchievementStatus {
      id:          a.id,
      title:       a.title,
      description: a.description,
      category:    a.category,
      rarity:      a.rarity,
      xp_reward:   a.xp_reward,
      unlocked:    (a.condition)(profile)
        || profile.unlocked_achievements.iter().any(|u| u == a.id),
    })
    .collect()
}

/// Append ids whose condition now holds but are not yet persisted. Returns the
/// newly recorded ids.
pub fn record_unlocks(profile: &mut UserProfile) -> Vec<&'static str> {
  let fresh: Vec<&'static str> = definitions_for(profile.role)
    .filter(|a| (a.condition)(profile))
    .map(|a| a.id)
    .filter(|id| !profile.unlocked_achievements.iter().any(|u| u == id))
    .collect();
  profile
    .unlocked_achievements
    .extend(fresh.iter().map(|id| (*id).to_owned()));
  fresh
}
