//! User profiles, roles and subscription tiers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{progress::Enrollment, reward};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Subscription tier. Declaration order is the gating order:
/// `Free < Pro < Enterprise`.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
  #[default]
  Free,
  Pro,
  Enterprise,
}

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Student,
  Teacher,
  Professional,
  Admin,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// What the identity provider tells us about an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  pub user_id: String,
  pub email:   String,
  /// Display name from the provider's user metadata, if any.
  pub name:    Option<String>,
  /// Role requested at sign-up, if any. Never trusted for `admin`.
  pub role:    Option<Role>,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The persisted per-user document (`user:<id>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id:                    String,
  pub email:                 String,
  pub name:                  String,
  #[serde(default)]
  pub role:                  Role,
  #[serde(default)]
  pub xp:                    u64,
  /// Always derived from `xp`; stored for readers that do not recompute.
  #[serde(default = "first_level")]
  pub level:                 u32,
  #[serde(default)]
  pub enrollments:           Vec<Enrollment>,
  #[serde(default)]
  pub completed_courses:     Vec<String>,
  #[serde(default)]
  pub current_streak:        u32,
  #[serde(default)]
  pub last_active_on:        Option<NaiveDate>,
  #[serde(default, rename = "dailyXP")]
  pub daily_xp:              u64,
  #[serde(default, rename = "dailyXPDate")]
  pub daily_xp_date:         Option<NaiveDate>,
  #[serde(default, rename = "subscription_tier")]
  pub subscription_tier:     Tier,
  #[serde(default)]
  pub unlocked_achievements: Vec<String>,
  #[serde(default)]
  pub posts_count:           u32,
  #[serde(default)]
  pub bio:                   Option<String>,
  #[serde(default)]
  pub avatar_url:            Option<String>,
  pub created_at:            DateTime<Utc>,

  /// Older documents kept a bare id list next to the detailed records.
  /// Read-only; folded into `enrollments` by [`UserProfile::normalize`].
  #[serde(default, rename = "enrolledCourses", skip_serializing)]
  legacy_enrolled_courses:   Vec<String>,
}

fn first_level() -> u32 { 1 }

impl UserProfile {
  /// A fresh profile for a first-time caller.
  pub fn from_identity(identity: &Identity, now: DateTime<Utc>) -> Self {
    let name = identity
      .name
      .clone()
      .filter(|n| !n.trim().is_empty())
      .unwrap_or_else(|| {
        identity
          .email
          .split('@')
          .next()
          .unwrap_or_default()
          .to_owned()
      });
    // Admin is only ever granted through the configured admin email.
    let role = match identity.role {
      Some(Role::Admin) | None => Role::Student,
      Some(r) => r,
    };
    Self {
      id: identity.user_id.clone(),
      email: identity.email.clone(),
      name,
      role,
      xp: 0,
      level: 1,
      enrollments: Vec::new(),
      completed_courses: Vec::new(),
      current_streak: 0,
      last_active_on: None,
      daily_xp: 0,
      daily_xp_date: None,
      subscription_tier: Tier::Free,
      unlocked_achievements: Vec::new(),
      posts_count: 0,
      bio: None,
      avatar_url: None,
      created_at: now,
      legacy_enrolled_courses: Vec::new(),
    }
  }

  /// The fixed-field profile forced for the configured admin account.
  pub fn admin(identity: &Identity, now: DateTime<Utc>) -> Self {
    Self {
      name: "Administrator".to_owned(),
      role: Role::Admin,
      subscription_tier: Tier::Enterprise,
      ..Self::from_identity(identity, now)
    }
  }

  /// Fold legacy fields into their current representation and re-derive
  /// `level`. Returns `true` if anything changed.
  pub fn normalize(&mut self, now: DateTime<Utc>) -> bool {
    let mut changed = false;
    for course_id in std::mem::take(&mut self.legacy_enrolled_courses) {
      if !self.is_enrolled(&course_id) {
        self.enrollments.push(Enrollment::new(course_id, now));
      }
      changed = true;
    }
    let level = reward::level_for(self.xp);
    if self.level != level {
      self.level = level;
      changed = true;
    }
    changed
  }

  pub fn is_enrolled(&self, course_id: &str) -> bool {
    self.enrollment(course_id).is_some()
  }

  pub fn enrollment(&self, course_id: &str) -> Option<&Enrollment> {
    self.enrollments.iter().find(|e| e.course_id == course_id)
  }

  pub fn enrollment_mut(&mut self, course_id: &str) -> Option<&mut Enrollment> {
    self.enrollments.iter_mut().find(|e| e.course_id == course_id)
  }

  /// The simple id list, derived from the enrollment records.
  pub fn enrolled_course_ids(&self) -> Vec<String> {
    self.enrollments.iter().map(|e| e.course_id.clone()).collect()
  }

  /// Total number of lessons completed across every enrollment.
  pub fn lessons_completed(&self) -> usize {
    self
      .enrollments
      .iter()
      .map(|e| e.completed_lessons.len())
      .sum()
  }

  /// Merge a self-service edit. `id`, `email`, XP and tier are not reachable
  /// through a patch.
  pub fn apply_patch(&mut self, patch: ProfilePatch) {
    if let Some(name) = patch.name {
      self.name = name;
    }
    if let Some(role) = patch.role {
      self.role = role;
    }
    if let Some(bio) = patch.bio {
      self.bio = Some(bio);
    }
    if let Some(avatar_url) = patch.avatar_url {
      self.avatar_url = Some(avatar_url);
    }
  }
}

/// Fields a user may change on their own profile. Unspecified fields are
/// retained.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
  pub name:       Option<String>,
  pub role:       Option<Role>,
  pub bio:        Option<String>,
  pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn identity() -> Identity {
    Identity {
      user_id: "u-1".into(),
      email:   "ada@example.com".into(),
      name:    None,
      role:    Some(Role::Admin),
    }
  }

  #[test]
  fn tiers_are_ordered() {
    assert!(Tier::Free < Tier::Pro);
    assert!(Tier::Pro < Tier::Enterprise);
    assert_eq!("pro".parse::<Tier>().unwrap(), Tier::Pro);
    assert_eq!(Tier::Enterprise.to_string(), "enterprise");
  }

  #[test]
  fn identity_cannot_self_assign_admin() {
    let now = Utc.timestamp_opt(0, 0).unwrap();
    let profile = UserProfile::from_identity(&identity(), now);
    assert_eq!(profile.role, Role::Student);
    assert_eq!(profile.name, "ada");
    assert_eq!(profile.level, 1);
  }

  #[test]
  fn admin_profile_has_fixed_fields() {
    let now = Utc.timestamp_opt(0, 0).unwrap();
    let profile = UserProfile::admin(&identity(), now);
    assert_eq!(profile.role, Role::Admin);
    assert_eq!(profile.subscription_tier, Tier::Enterprise);
    assert_eq!(profile.name, "Administrator");
  }

  #[test]
  fn legacy_enrolled_courses_are_migrated() {
    let json = serde_json::json!({
      "id": "u-1",
      "email": "ada@example.com",
      "name": "Ada",
      "xp": 1500,
      "level": 1,
      "enrolledCourses": ["intro-ai", "applied-ml"],
      "enrollments": [{
        "courseId": "intro-ai",
        "enrolledAt": "2024-01-01T00:00:00Z",
        "progress": 25,
        "completedLessons": [],
        "lastAccessedAt": "2024-01-01T00:00:00Z"
      }],
      "createdAt": "2024-01-01T00:00:00Z"
    });
    let mut profile: UserProfile = serde_json::from_value(json).unwrap();
    let now = Utc.timestamp_opt(0, 0).unwrap();

    assert!(profile.normalize(now));
    assert_eq!(profile.enrolled_course_ids(), vec!["intro-ai", "applied-ml"]);
    assert_eq!(profile.enrollment("intro-ai").unwrap().progress, 25);
    assert_eq!(profile.level, 2);

    let written = serde_json::to_value(&profile).unwrap();
    assert!(written.get("enrolledCourses").is_none());
    assert!(!profile.normalize(now));
  }

  #[test]
  fn patch_keeps_unspecified_fields() {
    let now = Utc.timestamp_opt(0, 0).unwrap();
    let mut profile = UserProfile::from_identity(&identity(), now);
    profile.bio = Some("hello".into());
    profile.apply_patch(ProfilePatch {
      name: Some("Ada L.".into()),
      ..Default::default()
    });
    assert_eq!(profile.name, "Ada L.");
    assert_eq!(profile.bio.as_deref(), Some("hello"));
    assert_eq!(profile.email, "ada@example.com");
  }
}
