//! Pairwise compatibility scoring.
//!
//! The score rewards reciprocity first (each side's offered skills covering the
//! other side's wants), then adds smaller social terms. It is a pure function of
//! the two profiles.

use crate::domain::model::{Proficiency, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MAX_SCORE: f64 = 100.0;
const RECIPROCITY_WEIGHT: f64 = 40.0;
const ENGAGEMENT_CAP: u32 = 10;
const RATING_WEIGHT: f64 = 0.5;
const RESPONSE_WEIGHT: f64 = 0.1;
const LOCATION_BONUS: f64 = 5.0;
const INTEREST_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub reciprocity: f64,
    pub proficiency: f64,
    pub engagement: f64,
    pub rating: f64,
    pub response_rate: f64,
    pub location_match: bool,
    pub mutual_skills: BTreeSet<String>,
    pub common_interests: BTreeSet<String>,
}

/// Rounds half away from zero to one decimal.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn proficiency_credit(level: Option<Proficiency>) -> f64 {
    match level {
        Some(Proficiency::Expert) => 6.0,
        Some(Proficiency::Intermediate) => 3.0,
        Some(Proficiency::Beginner) | None => 0.0,
    }
}

fn coverage(matched: usize, wanted: usize) -> f64 {
    if wanted == 0 {
        0.0
    } else {
        RECIPROCITY_WEIGHT * matched as f64 / wanted as f64
    }
}

/// Scores `a` against `b`, returning the total in `[0, 100]` and its parts.
///
/// Only `a`'s proficiency on the skills it can teach `b` earns credit; `b`'s
/// levels never count, so `score(a, b)` and `score(b, a)` may differ.
pub fn score(a: &UserProfile, b: &UserProfile) -> (f64, Breakdown) {
    let a_to_b: BTreeSet<&String> = a.skills_offered.intersection(&b.skills_wanted).collect();
    let b_to_a: BTreeSet<&String> = b.skills_offered.intersection(&a.skills_wanted).collect();

    let reciprocity = coverage(a_to_b.len(), b.skills_wanted.len())
        + coverage(b_to_a.len(), a.skills_wanted.len());

    let proficiency: f64 = a_to_b
        .iter()
        .map(|tag| proficiency_credit(a.proficiency_for(tag)))
        .sum();

    let engagement = a
        .swaps_completed
        .saturating_add(b.swaps_completed)
        .min(ENGAGEMENT_CAP) as f64;
    let rating = (a.rating + b.rating) / 2.0 * RATING_WEIGHT;
    let response_rate = (a.response_rate + b.response_rate) / 2.0 * RESPONSE_WEIGHT;

    let location_match = !a.location.is_empty() && a.location == b.location;
    let location = if location_match { LOCATION_BONUS } else { 0.0 };

    let common_interests: BTreeSet<String> =
        a.interests.intersection(&b.interests).cloned().collect();
    let interests = INTEREST_WEIGHT * common_interests.len() as f64;

    let total = reciprocity + proficiency + engagement + rating + response_rate + location + interests;
    let total = round1(total.clamp(0.0, MAX_SCORE));

    let breakdown = Breakdown {
        reciprocity: round1(reciprocity),
        proficiency: round1(proficiency),
        engagement: round1(engagement),
        rating: round1(rating),
        response_rate: round1(response_rate),
        location_match,
        mutual_skills: a_to_b.union(&b_to_a).map(|tag| (*tag).clone()).collect(),
        common_interests,
    };

    (total, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Proficiency::{Expert, Intermediate};

    fn blank(name: &str) -> UserProfile {
        UserProfile::new(name, format!("{}@example.com", name)).with_id(name)
    }

    #[test]
    fn test_mutual_expert_pair() {
        let a = blank("a")
            .offering("python", Some(Expert))
            .offering("django", Some(Expert))
            .wanting("react");
        let b = blank("b").offering("react", Some(Expert)).wanting("python");

        let (total, details) = score(&a, &b);

        assert_eq!(details.reciprocity, 80.0);
        // only a's python counts: a -> b is {python}
        assert_eq!(details.proficiency, 6.0);
        assert_eq!(details.engagement, 0.0);
        assert_eq!(details.rating, 2.5);
        assert_eq!(details.response_rate, 10.0);
        assert!(!details.location_match);
        assert_eq!(total, 98.5);
        let mutual: Vec<&str> = details.mutual_skills.iter().map(String::as_str).collect();
        assert_eq!(mutual, vec!["python", "react"]);
    }

    #[test]
    fn test_total_is_capped() {
        let mut a = blank("a")
            .offering("python", Some(Expert))
            .wanting("react")
            .located_in("Pune")
            .with_interests(["chess", "hiking", "jazz"]);
        let mut b = blank("b")
            .offering("react", Some(Expert))
            .wanting("python")
            .located_in("Pune")
            .with_interests(["chess", "hiking", "jazz"]);
        a.swaps_completed = 8;
        b.swaps_completed = 8;

        let (total, details) = score(&a, &b);
        assert_eq!(total, 100.0);
        assert_eq!(details.engagement, 10.0);
        assert!(details.location_match);
        assert_eq!(details.common_interests.len(), 3);
    }

    #[test]
    fn test_no_overlap_still_has_social_score() {
        let a = blank("a").offering("go", None).wanting("rust");
        let b = blank("b").offering("cooking", None).wanting("painting");

        let (total, details) = score(&a, &b);
        assert_eq!(details.reciprocity, 0.0);
        assert_eq!(details.proficiency, 0.0);
        assert!(details.mutual_skills.is_empty());
        assert_eq!(total, 12.5);
    }

    #[test]
    fn test_empty_wants_do_not_divide_by_zero() {
        let a = blank("a").offering("go", Some(Expert));
        let b = blank("b");

        let (total, details) = score(&a, &b);
        assert_eq!(details.reciprocity, 0.0);
        assert!(total.is_finite());
    }

    #[test]
    fn test_one_sided_match_scores_half() {
        let a = blank("a").offering("sql", Some(Intermediate));
        let b = blank("b").wanting("sql").wanting("excel");

        let (_, details) = score(&a, &b);
        assert_eq!(details.reciprocity, 20.0);
        assert_eq!(details.proficiency, 3.0);
    }

    #[test]
    fn test_proficiency_only_counts_the_teaching_side() {
        // b is Expert at guitar, a has no level for it; a -> b still earns nothing
        let a = blank("a").offering("guitar", None).wanting("guitar");
        let b = blank("b").offering("guitar", Some(Expert)).wanting("guitar");

        let (_, ab) = score(&a, &b);
        assert_eq!(ab.proficiency, 0.0);

        let (_, ba) = score(&b, &a);
        assert_eq!(ba.proficiency, 6.0);
    }

    #[test]
    fn test_location_bonus() {
        let a = blank("a").located_in("Lima");
        let b = blank("b").located_in("Lima");
        let c = blank("c").located_in("Quito");
        let nowhere = blank("d");

        let (with_bonus, details) = score(&a, &b);
        assert!(details.location_match);
        let (without, details) = score(&a, &c);
        assert!(!details.location_match);
        assert_eq!(round1(with_bonus - without), 5.0);

        let (_, details) = score(&nowhere, &blank("e"));
        assert!(!details.location_match);

        // one side blank never earns the bonus, in either direction
        let (lima_first, details) = score(&a, &nowhere);
        assert!(!details.location_match);
        let (blank_first, details) = score(&nowhere, &a);
        assert!(!details.location_match);
        assert_eq!(lima_first, without);
        assert_eq!(blank_first, without);
    }

    #[test]
    fn test_scores_stay_in_range_for_extreme_counters() {
        let mut a = blank("a");
        let mut b = blank("b");
        a.swaps_completed = u32::MAX;
        b.swaps_completed = u32::MAX;
        a.rating = 0.0;
        b.rating = 0.0;
        a.response_rate = 0.0;
        b.response_rate = 0.0;

        let (total, details) = score(&a, &b);
        assert_eq!(details.engagement, 10.0);
        assert!((0.0..=MAX_SCORE).contains(&total));
    }
}
