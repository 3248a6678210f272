//! Badge rules over a learner's completion history.

use chrono::{DateTime, Utc};

use crate::content::badges::{CONVERSATIONALIST, FIRST_STEPS, LANGUAGE_ENTHUSIAST, PERFECT_SCORE, QUICK_LEARNER};
use crate::domain::{Badge, UserProgress};

/// A lesson finished in under this many seconds earns Quick Learner
pub const QUICK_LEARNER_SECONDS: u64 = 600;

/// When the badge was earned, if it was. Records are in chronological order.
fn earned_at(badge_id: &str, records: &[&UserProgress]) -> Option<DateTime<Utc>> {
  let nth = |n: usize| records.get(n - 1).map(|p| p.completed_at);
  match badge_id {
    FIRST_STEPS => nth(1),
    CONVERSATIONALIST => nth(5),
    LANGUAGE_ENTHUSIAST => nth(10),
    PERFECT_SCORE => records.iter().find(|p| p.is_perfect()).map(|p| p.completed_at),
    QUICK_LEARNER => records
      .iter()
      .find(|p| p.time_spent < QUICK_LEARNER_SECONDS)
      .map(|p| p.completed_at),
    _ => None,
  }
}

/// Earned badges in catalog order, each stamped with the completion that earned it
pub fn evaluate_badges(history: &[UserProgress], catalog: &[Badge]) -> Vec<Badge> {
  let mut records: Vec<&UserProgress> = history.iter().collect();
  records.sort_by_key(|p| p.completed_at);

  catalog
    .iter()
    .filter_map(|badge| earned_at(&badge.badge_id, &records).map(|at| badge.earned(at)))
    .collect()
}
