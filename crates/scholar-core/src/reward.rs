//! XP rewards and level derivation.

use chrono::NaiveDate;
use serde::Serialize;

use crate::profile::UserProfile;

/// XP needed per level.
pub const XP_PER_LEVEL: u64 = 1000;

pub const ENROLLMENT_XP: u64 = 50;
pub const COMMUNITY_POST_XP: u64 = 25;
pub const COMMENT_XP: u64 = 10;

/// An action that grants XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reward {
  Enrollment,
  /// Amount supplied by the caller; varies per lesson.
  LessonCompletion(u32),
  CommunityPost,
  Comment,
}

impl Reward {
  pub fn amount(self) -> u64 {
    match self {
      Self::Enrollment => ENROLLMENT_XP,
      Self::LessonCompletion(xp) => u64::from(xp),
      Self::CommunityPost => COMMUNITY_POST_XP,
      Self::Comment => COMMENT_XP,
    }
  }
}

/// Level `L` covers `[(L-1)*1000, L*1000)`.
pub fn level_for(xp: u64) -> u32 {
  u32::try_from(xp / XP_PER_LEVEL + 1).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
  pub level:            u32,
  /// Percent of the way through the current level.
  pub progress_percent: f64,
  pub xp_to_next_level: u64,
}

pub fn level_progress(xp: u64) -> LevelProgress {
  let level = level_for(xp);
  let floor = u64::from(level - 1) * XP_PER_LEVEL;
  LevelProgress {
    level,
    progress_percent: ((xp - floor) as f64 / XP_PER_LEVEL as f64 * 100.0).min(100.0),
    xp_to_next_level: (u64::from(level) * XP_PER_LEVEL).saturating_sub(xp),
  }
}

/// Apply `reward` to `profile` as of `today`: lifetime and daily XP, streak,
/// and level. Returns the XP granted.
pub fn award(profile: &mut UserProfile, reward: Reward, today: NaiveDate) -> u64 {
  let amount = reward.amount();
  if amount == 0 {
    return 0;
  }

  if profile.daily_xp_date != Some(today) {
    profile.daily_xp = 0;
    profile.daily_xp_date = Some(today);
  }
  touch_streak(profile, today);

  profile.xp = profile.xp.saturating_add(amount);
  profile.daily_xp = profile.daily_xp.saturating_add(amount);
  profile.level = level_for(profile.xp);
  amount
}

/// Count consecutive active days.
fn touch_streak(profile: &mut UserProfile, today: NaiveDate) {
  profile.current_streak = match profile.last_active_on {
    Some(d) if d == today => profile.current_streak.max(1),
    Some(d) if d.succ_opt() == Some(today) => profile.current_streak + 1,
    _ => 1,
  };
  profile.last_active_on = Some(today);
}

/// Set XP directly. Only administrators reach this; it is the one path that
/// may lower XP.
pub fn set_xp(profile: &mut UserProfile, xp: u64) {
  profile.xp = xp;
  profile.level = level_for(xp);
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::profile::Identity;

  fn profile() -> UserProfile {
    UserProfile::from_identity(
      &Identity {
        user_id: "u".into(),
        email:   "u@example.com".into(),
        name:    None,
        role:    None,
      },
      Utc.timestamp_opt(0, 0).unwrap(),
    )
  }

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, d).unwrap() }

  #[test]
  fn level_boundaries() {
    assert_eq!(level_for(0), 1);
    assert_eq!(level_for(999), 1);
    assert_eq!(level_for(1000), 2);
    assert_eq!(level_for(2999), 3);
    assert_eq!(level_for(3000), 4);
  }

  #[test]
  fn level_is_monotonic() {
    let mut prev = level_for(0);
    for xp in (0..20_000).step_by(7) {
      let l = level_for(xp);
      assert!(l >= prev, "level dropped at xp={xp}");
      prev = l;
    }
  }

  #[test]
  fn progress_within_level() {
    let p = level_progress(1250);
    assert_eq!(p.level, 2);
    assert!((p.progress_percent - 25.0).abs() < f64::EPSILON);
    assert_eq!(p.xp_to_next_level, 750);

    let start = level_progress(0);
    assert_eq!(start.progress_percent, 0.0);
    assert_eq!(start.xp_to_next_level, 1000);
  }

  #[test]
  fn progress_is_capped_at_the_top_level() {
    let p = level_progress(u64::MAX);
    assert_eq!(p.level, u32::MAX);
    assert_eq!(p.progress_percent, 100.0);
    assert_eq!(p.xp_to_next_level, 0);
  }

  #[test]
  fn award_updates_daily_and_level() {
    let mut p = profile();
    p.xp = 980;
    assert_eq!(award(&mut p, Reward::Enrollment, day(1)), 50);
    assert_eq!(p.xp, 1030);
    assert_eq!(p.level, 2);
    assert_eq!(p.daily_xp, 50);

    award(&mut p, Reward::Comment, day(1));
    assert_eq!(p.daily_xp, 60);

    award(&mut p, Reward::CommunityPost, day(2));
    assert_eq!(p.daily_xp, 25);
    assert_eq!(p.xp, 1065);
  }

  #[test]
  fn streak_counts_consecutive_days() {
    let mut p = profile();
    award(&mut p, Reward::Comment, day(1));
    award(&mut p, Reward::Comment, day(1));
    assert_eq!(p.current_streak, 1);
    award(&mut p, Reward::Comment, day(2));
    award(&mut p, Reward::Comment, day(3));
    assert_eq!(p.current_streak, 3);
    award(&mut p, Reward::Comment, day(5));
    assert_eq!(p.current_streak, 1);
  }

  #[test]
  fn zero_reward_changes_nothing() {
    let mut p = profile();
    assert_eq!(award(&mut p, Reward::LessonCompletion(0), day(1)), 0);
    assert_eq!(p.current_streak, 0);
    assert_eq!(p.daily_xp_date, None);
  }

  #[test]
  fn admin_can_lower_xp() {
    let mut p = profile();
    p.xp = 5000;
    p.level = level_for(5000);
    set_xp(&mut p, 10);
    assert_eq!(p.level, 1);
  }
}
