use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of one finished lesson. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
  pub progress_id: String,
  pub user_id: String,
  pub lesson_id: String,
  /// Percentage of available points earned, 0..=100
  pub score: f64,
  pub completed_at: DateTime<Utc>,
  /// Seconds
  pub time_spent: u64,
  pub exercises_completed: u32,
  pub total_exercises: u32,
}

impl UserProgress {
  pub fn new(
    user_id: impl Into<String>,
    lesson_id: impl Into<String>,
    score: f64,
    completed_at: DateTime<Utc>,
    time_spent: u64,
    total_exercises: u32,
  ) -> Self {
    Self {
      progress_id: uuid::Uuid::new_v4().to_string(),
      user_id: user_id.into(),
      lesson_id: lesson_id.into(),
      score,
      completed_at,
      time_spent,
      exercises_completed: total_exercises,
      total_exercises,
    }
  }

  pub fn is_perfect(&self) -> bool {
    self.score >= 100.0
  }
}

/// Suggested next lesson with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
  pub lesson_id: String,
  pub reason: String,
  /// 0.0..=1.0, decreasing with rank
  pub confidence: f64,
}

/// Round a score for display; stored records keep the raw value
pub fn round_score(score: f64) -> f64 {
  (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_round_score() {
    assert_eq!(round_score(200.0 / 3.0), 66.67);
    assert_eq!(round_score(100.0), 100.0);
    assert_eq!(round_score(0.0), 0.0);
    assert_eq!(round_score(33.333), 33.33);
  }

  #[test]
  fn test_new_marks_all_exercises_completed() {
    let p = UserProgress::new("u1", "L001", 80.0, Utc::now(), 120, 4);
    assert_eq!(p.exercises_completed, 4);
    assert_eq!(p.total_exercises, 4);
    assert!(!p.progress_id.is_empty());
    assert!(!p.is_perfect());
  }
}
