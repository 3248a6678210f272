//! Next-lesson recommendations from score history and difficulty.

use std::collections::HashSet;

use crate::domain::{Difficulty, Lesson, Recommendation, UserProgress};

/// Maximum number of suggestions returned
pub const RECOMMENDATION_LIMIT: usize = 3;

/// Mean score at or above which the learner is nudged up a difficulty
const STRONG_MEAN_SCORE: f64 = 80.0;

/// Rank `rank` confidence, starting at `start_pct` percent and dropping 10 points per rank
fn confidence(start_pct: u32, rank: usize) -> f64 {
  start_pct.saturating_sub(10 * rank as u32) as f64 / 100.0
}

/// Rank up to three lessons the learner has not completed.
///
/// `catalog` is the learner's lesson list (already filtered to their language
/// and user type) in catalog order. `history` is in completion order, newest last.
pub fn recommend(history: &[UserProgress], catalog: &[&Lesson]) -> Vec<Recommendation> {
  let completed: HashSet<&str> = history.iter().map(|p| p.lesson_id.as_str()).collect();
  let eligible = catalog.iter().copied().filter(|l| !completed.contains(l.lesson_id.as_str()));

  let Some(last) = history.last() else {
    return eligible
      .filter(|l| l.difficulty == Difficulty::Beginner)
      .take(RECOMMENDATION_LIMIT)
      .enumerate()
      .map(|(rank, l)| Recommendation {
        lesson_id: l.lesson_id.clone(),
        reason: if rank == 0 { "Perfect for beginners" } else { "Continue with basics" }.to_string(),
        confidence: confidence(90, rank),
      })
      .collect();
  };

  let mean = history.iter().map(|p| p.score).sum::<f64>() / history.len() as f64;
  let last_difficulty = catalog
    .iter()
    .find(|l| l.lesson_id == last.lesson_id)
    .map(|l| l.difficulty);

  if mean >= STRONG_MEAN_SCORE {
    let next = match last_difficulty {
      Some(Difficulty::Beginner) => Difficulty::Intermediate,
      _ => Difficulty::Advanced,
    };
    eligible
      .filter(|l| Some(l.difficulty) == last_difficulty || l.difficulty == next)
      .take(RECOMMENDATION_LIMIT)
      .enumerate()
      .map(|(rank, l)| Recommendation {
        lesson_id: l.lesson_id.clone(),
        reason: if rank == 0 { "Based on your excellent progress" } else { "Recommended for you" }.to_string(),
        confidence: confidence(85, rank),
      })
      .collect()
  } else {
    eligible
      .filter(|l| Some(l.difficulty) == last_difficulty)
      .take(RECOMMENDATION_LIMIT)
      .enumerate()
      .map(|(rank, l)| Recommendation {
        lesson_id: l.lesson_id.clone(),
        reason: "Practice makes perfect".to_string(),
        confidence: confidence(75, rank),
      })
      .collect()
  }
}
