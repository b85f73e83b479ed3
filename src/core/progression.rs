//! Experience, levels and milestone badges, all derived from counters.

use crate::domain::model::{Badge, UserProfile};
use serde::Serialize;
use std::collections::BTreeSet;

pub const XP_PER_SWAP: u64 = 50;
const XP_STEP: u128 = 100;

/// Total experience needed to stand at `level` (level 1 needs none).
///
/// Leaving level `L` costs `L * 100`, so the totals are 0, 100, 300, 600, ...
pub fn xp_to_reach(level: u32) -> u128 {
    let level = u128::from(level.max(1));
    XP_STEP * level * (level - 1) / 2
}

pub fn level_for(xp: u64) -> u32 {
    let xp = u128::from(xp);
    // closed-form guess, then correct float error in either direction
    let guess = (1.0 + (1.0 + 8.0 * xp as f64 / XP_STEP as f64).sqrt()) / 2.0;
    let mut level = (guess.floor() as u32).max(1);
    while level > 1 && xp_to_reach(level) > xp {
        level -= 1;
    }
    while level < u32::MAX && xp_to_reach(level + 1) <= xp {
        level += 1;
    }
    level
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u64,
    /// `xp mod (level * 100)`
    pub into_level: u64,
    /// `level * 100`
    pub level_span: u64,
}

impl LevelProgress {
    pub fn for_xp(xp: u64) -> Self {
        let level = level_for(xp);
        let level_span = u64::from(level).saturating_mul(XP_STEP as u64);
        Self {
            level,
            xp,
            into_level: xp % level_span,
            level_span,
        }
    }

    pub fn percent(&self) -> f64 {
        self.into_level as f64 / self.level_span as f64 * 100.0
    }
}

/// Every badge whose threshold `swaps_completed` has reached.
pub fn badges_for(swaps_completed: u32) -> BTreeSet<Badge> {
    Badge::ALL
        .into_iter()
        .filter(|badge| swaps_completed >= badge.threshold())
        .collect()
}

/// Unions the earned badges into the profile and returns the new ones.
/// Existing badges are never removed.
pub fn award_badges(user: &mut UserProfile) -> Vec<Badge> {
    badges_for(user.swaps_completed)
        .into_iter()
        .filter(|badge| user.badges.insert(*badge))
        .collect()
}

/// Overwrites the cached level with the one derived from experience.
pub fn sync_level(user: &mut UserProfile) {
    user.level = level_for(user.experience_points);
}

pub fn sync_levels(users: &mut [UserProfile]) {
    for user in users {
        sync_level(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds_grow_linearly() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(299), 2);
        assert_eq!(level_for(300), 3);
        assert_eq!(level_for(599), 3);
        assert_eq!(level_for(600), 4);
    }

    #[test]
    fn test_level_for_huge_xp_does_not_overflow() {
        let level = level_for(u64::MAX);
        assert!(xp_to_reach(level) <= u128::from(u64::MAX));
        assert!(xp_to_reach(level + 1) > u128::from(u64::MAX));
    }

    #[test]
    fn test_progress_uses_level_span() {
        let progress = LevelProgress::for_xp(250);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.level_span, 200);
        assert_eq!(progress.into_level, 50);
        assert_eq!(progress.percent(), 25.0);
    }

    #[test]
    fn test_badges_for_thresholds() {
        assert!(badges_for(0).is_empty());
        assert_eq!(badges_for(1).into_iter().collect::<Vec<_>>(), vec![Badge::FirstSwap]);
        assert_eq!(badges_for(5).len(), 2);
        assert_eq!(badges_for(12).len(), 3);
    }

    #[test]
    fn test_award_badges_is_idempotent() {
        let mut user = UserProfile::new("Ana", "ana@example.com");
        user.swaps_completed = 5;
        let first = award_badges(&mut user);
        assert_eq!(first, vec![Badge::FirstSwap, Badge::ActiveLearner]);

        user.swaps_completed = 6;
        assert!(award_badges(&mut user).is_empty());
        assert_eq!(user.badges.len(), 2);
    }

    #[test]
    fn test_badges_are_never_revoked() {
        let mut user = UserProfile::new("Ana", "ana@example.com");
        user.badges.insert(Badge::ExpertSwapper);
        user.swaps_completed = 1;
        award_badges(&mut user);
        assert!(user.badges.contains(&Badge::ExpertSwapper));
        assert!(user.badges.contains(&Badge::FirstSwap));
    }

    #[test]
    fn test_sync_level_replaces_stale_cache() {
        let mut user = UserProfile::new("Ana", "ana@example.com");
        user.level = 3;
        user.experience_points = 250;
        sync_level(&mut user);
        assert_eq!(user.level, 2);
    }
}
