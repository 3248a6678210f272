//! Aggregate learner statistics.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{round_score, Category, Lesson, UserProgress};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
  pub total_lessons_completed: usize,
  /// Mean score rounded to two decimals
  pub average_score: f64,
  /// Seconds
  pub total_time_spent: u64,
  pub vocabulary_learned: u32,
  pub badges_earned: usize,
  /// Consecutive days with a completion, ending today or yesterday
  pub current_streak: u32,
  /// Share of the learner's lessons completed at least once, 0..=100
  pub completion_percentage: f64,
}

impl UserStats {
  /// `catalog` is the learner's lesson list; `today` is the current UTC date
  pub fn compute(history: &[UserProgress], catalog: &[&Lesson], badges_earned: usize, today: NaiveDate) -> Self {
    let completed: HashSet<&str> = history.iter().map(|p| p.lesson_id.as_str()).collect();
    let completed_lessons: Vec<&Lesson> = catalog
      .iter()
      .copied()
      .filter(|l| completed.contains(l.lesson_id.as_str()))
      .collect();

    let average_score = if history.is_empty() {
      0.0
    } else {
      round_score(history.iter().map(|p| p.score).sum::<f64>() / history.len() as f64)
    };

    let completion_percentage = if catalog.is_empty() {
      0.0
    } else {
      round_score(100.0 * completed_lessons.len() as f64 / catalog.len() as f64)
    };

    Self {
      total_lessons_completed: history.len(),
      average_score,
      total_time_spent: history.iter().map(|p| p.time_spent).sum(),
      vocabulary_learned: completed_lessons.iter().map(|l| l.vocabulary_count).sum(),
      badges_earned,
      current_streak: current_streak(history, today),
      completion_percentage,
    }
  }
}

/// Days in a row with at least one completion. A streak survives until the
/// end of the day after its last completion.
pub fn current_streak(history: &[UserProgress], today: NaiveDate) -> u32 {
  let days: HashSet<NaiveDate> = history.iter().map(|p| p.completed_at.date_naive()).collect();

  let mut day = if days.contains(&today) {
    today
  } else {
    let yesterday = today - Duration::days(1);
    if !days.contains(&yesterday) {
      return 0;
    }
    yesterday
  };

  let mut streak = 0;
  while days.contains(&day) {
    streak += 1;
    day = day - Duration::days(1);
  }
  streak
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProgress {
  pub category: Category,
  pub lessons_completed: usize,
  pub average_score: f64,
}

/// Completions and mean score per category, in category order. Categories
/// without completions and records for unknown lessons are left out.
pub fn category_breakdown(history: &[UserProgress], catalog: &[&Lesson]) -> Vec<CategoryProgress> {
  Category::ALL
    .into_iter()
    .filter_map(|category| {
      let scores: Vec<f64> = history
        .iter()
        .filter(|p| {
          catalog
            .iter()
            .any(|l| l.lesson_id == p.lesson_id && l.category == category)
        })
        .map(|p| p.score)
        .collect();
      if scores.is_empty() {
        return None;
      }
      Some(CategoryProgress {
        category,
        lessons_completed: scores.len(),
        average_score: round_score(scores.iter().sum::<f64>() / scores.len() as f64),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::{LessonCatalog, StaticCatalog};
  use crate::domain::{TargetLanguage, UserType};
  use chrono::{TimeZone, Utc};

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
  }

  fn record(lesson_id: &str, score: f64, days_ago: i64, time_spent: u64) -> UserProgress {
    let at = Utc.with_ymd_and_hms(2026, 5, 20, 8, 30, 0).unwrap() - Duration::days(days_ago);
    UserProgress::new("u1", lesson_id, score, at, time_spent, 3)
  }

  #[test]
  fn test_empty_history() {
    let catalog = StaticCatalog::bundled().unwrap();
    let lessons = catalog.lessons_for_user(UserType::Tourist, TargetLanguage::Kinyarwanda);
    let stats = UserStats::compute(&[], &lessons, 0, today());
    assert_eq!(stats.total_lessons_completed, 0);
    assert_eq!(stats.average_score, 0.0);
    assert_eq!(stats.total_time_spent, 0);
    assert_eq!(stats.vocabulary_learned, 0);
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.completion_percentage, 0.0);
  }

  #[test]
  fn test_compute() {
    let catalog = StaticCatalog::bundled().unwrap();
    let lessons = catalog.lessons_for_user(UserType::Tourist, TargetLanguage::Kinyarwanda);
    let history = [
      record("L001", 100.0, 2, 300),
      record("L002", 50.0, 1, 600),
      record("L001", 60.0, 0, 200),
    ];
    let stats = UserStats::compute(&history, &lessons, 3, today());
    assert_eq!(stats.total_lessons_completed, 3);
    assert_eq!(stats.average_score, 70.0);
    assert_eq!(stats.total_time_spent, 1100);
    // L001 (12 words) counted once, L002 (15 words)
    assert_eq!(stats.vocabulary_learned, 27);
    assert_eq!(stats.badges_earned, 3);
    assert_eq!(stats.current_streak, 3);
    // 2 of 6 lessons
    assert_eq!(stats.completion_percentage, 33.33);
  }

  #[test]
  fn test_streak_from_yesterday() {
    let history = [record("L001", 80.0, 1, 300), record("L002", 80.0, 2, 300), record("L003", 80.0, 4, 300)];
    assert_eq!(current_streak(&history, today()), 2);
  }

  #[test]
  fn test_streak_broken() {
    let history = [record("L001", 80.0, 2, 300), record("L002", 80.0, 3, 300)];
    assert_eq!(current_streak(&history, today()), 0);
  }

  #[test]
  fn test_streak_counts_days_not_records() {
    let history = [record("L001", 80.0, 0, 300), record("L002", 80.0, 0, 300)];
    assert_eq!(current_streak(&history, today()), 1);
  }

  #[test]
  fn test_category_breakdown() {
    let catalog = StaticCatalog::bundled().unwrap();
    let lessons: Vec<&Lesson> = catalog.lessons().iter().collect();
    let history = [
      record("L003", 80.0, 0, 300),
      record("L001", 90.0, 0, 300),
      record("L003", 61.0, 0, 300),
      record("L999", 10.0, 0, 300),
    ];
    let breakdown = category_breakdown(&history, &lessons);
    assert_eq!(
      breakdown,
      vec![
        CategoryProgress { category: Category::Greetings, lessons_completed: 1, average_score: 90.0 },
        CategoryProgress { category: Category::Food, lessons_completed: 2, average_score: 70.5 },
      ]
    );
  }
}
