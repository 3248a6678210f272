//! Lesson session state machine.
//!
//! A session walks one learner through one lesson:
//! vocabulary -> phrases -> cultural -> exercises -> complete.
//! The reading stages can be revisited until exercises begin; after that the
//! session only moves forward. Finishing the last exercise emits exactly one
//! [`UserProgress`]. The engine never persists anything itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::content::LessonCatalog;
use crate::domain::{Answer, Exercise, Lesson, UserProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Vocabulary,
  Phrases,
  Cultural,
  Exercises,
  Complete,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Vocabulary => "vocabulary",
      Self::Phrases => "phrases",
      Self::Cultural => "cultural",
      Self::Exercises => "exercises",
      Self::Complete => "complete",
    }
  }

  fn next(self) -> Option<Self> {
    match self {
      Self::Vocabulary => Some(Self::Phrases),
      Self::Phrases => Some(Self::Cultural),
      Self::Cultural => Some(Self::Exercises),
      Self::Exercises | Self::Complete => None,
    }
  }

  fn previous(self) -> Option<Self> {
    match self {
      Self::Phrases => Some(Self::Vocabulary),
      Self::Cultural => Some(Self::Phrases),
      Self::Vocabulary | Self::Exercises | Self::Complete => None,
    }
  }
}

impl std::fmt::Display for Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
  #[error("Lesson not found")]
  LessonNotFound(String),
  #[error("Cannot {action} from the {from} stage")]
  InvalidTransition { from: Stage, action: &'static str },
  #[error("Exercises are not in progress (current stage: {0})")]
  NotInExercises(Stage),
  #[error("Check the current answer before moving on")]
  NotRevealed,
  #[error("Answer does not fit this exercise type")]
  AnswerShapeMismatch,
}

/// What happened to a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
  Stored,
  IgnoredEmpty,
  /// The exercise was already checked; its answer can no longer change
  Locked,
}

/// Result of checking the current exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
  pub exercise_id: String,
  pub correct: bool,
  pub points_earned: u32,
  pub correct_answer: String,
  pub explanation: Option<String>,
}

impl Feedback {
  pub fn for_exercise(exercise: &Exercise, correct: bool) -> Self {
    Self {
      exercise_id: exercise.exercise_id.clone(),
      correct,
      points_earned: if correct { exercise.points } else { 0 },
      correct_answer: exercise.key.display(),
      explanation: exercise.explanation.clone(),
    }
  }
}

/// Result of moving past the current exercise.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
  /// Moved to the exercise at this index
  Next(usize),
  Completed(UserProgress),
}

#[derive(Debug, Clone)]
pub struct LessonSession {
  lesson: Lesson,
  user_id: String,
  stage: Stage,
  exercise_index: usize,
  answers: HashMap<String, Answer>,
  /// Checked exercises and whether they were correct
  revealed: HashMap<String, bool>,
  points_earned: u32,
  started_at: DateTime<Utc>,
  progress: Option<UserProgress>,
}

impl LessonSession {
  pub fn start(
    catalog: &dyn LessonCatalog,
    lesson_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
  ) -> Result<Self, SessionError> {
    let lesson = catalog
      .find_lesson(lesson_id)
      .ok_or_else(|| SessionError::LessonNotFound(lesson_id.to_string()))?;
    Ok(Self::new(lesson.clone(), user_id, now))
  }

  pub fn new(lesson: Lesson, user_id: &str, now: DateTime<Utc>) -> Self {
    tracing::debug!("Starting session for lesson {} (user {})", lesson.lesson_id, user_id);
    Self {
      lesson,
      user_id: user_id.to_string(),
      stage: Stage::Vocabulary,
      exercise_index: 0,
      answers: HashMap::new(),
      revealed: HashMap::new(),
      points_earned: 0,
      started_at: now,
      progress: None,
    }
  }

  pub fn lesson(&self) -> &Lesson {
    &self.lesson
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  pub fn stage(&self) -> Stage {
    self.stage
  }

  pub fn exercise_index(&self) -> usize {
    self.exercise_index
  }

  pub fn exercise_count(&self) -> usize {
    self.lesson.content.exercises.len()
  }

  pub fn started_at(&self) -> DateTime<Utc> {
    self.started_at
  }

  pub fn points_earned(&self) -> u32 {
    self.points_earned
  }

  pub fn points_possible(&self) -> u32 {
    self.lesson.content.total_points()
  }

  /// The record emitted on completion
  pub fn progress(&self) -> Option<&UserProgress> {
    self.progress.as_ref()
  }

  pub fn current_exercise(&self) -> Option<&Exercise> {
    if self.stage != Stage::Exercises {
      return None;
    }
    self.lesson.content.exercises.get(self.exercise_index)
  }

  pub fn submitted_answer(&self, exercise_id: &str) -> Option<&Answer> {
    self.answers.get(exercise_id)
  }

  pub fn is_revealed(&self, exercise_id: &str) -> bool {
    self.revealed.contains_key(exercise_id)
  }

  /// Feedback for the current exercise if it has been checked
  pub fn current_feedback(&self) -> Option<Feedback> {
    let exercise = self.current_exercise()?;
    let correct = *self.revealed.get(&exercise.exercise_id)?;
    Some(Feedback::for_exercise(exercise, correct))
  }

  pub fn continue_stage(&mut self) -> Result<Stage, SessionError> {
    let next = self.stage.next().ok_or(SessionError::InvalidTransition {
      from: self.stage,
      action: "continue",
    })?;
    tracing::debug!("Lesson {}: {} -> {}", self.lesson.lesson_id, self.stage, next);
    self.stage = next;
    Ok(next)
  }

  pub fn go_back(&mut self) -> Result<Stage, SessionError> {
    let previous = self.stage.previous().ok_or(SessionError::InvalidTransition {
      from: self.stage,
      action: "go back",
    })?;
    tracing::debug!("Lesson {}: {} -> {}", self.lesson.lesson_id, self.stage, previous);
    self.stage = previous;
    Ok(previous)
  }

  fn require_exercises(&self) -> Result<(), SessionError> {
    if self.stage != Stage::Exercises {
      return Err(SessionError::NotInExercises(self.stage));
    }
    Ok(())
  }

  /// Store an answer for the current exercise, replacing any unchecked one
  pub fn submit_answer(&mut self, answer: Answer) -> Result<SubmitOutcome, SessionError> {
    self.require_exercises()?;
    let Some(exercise) = self.lesson.content.exercises.get(self.exercise_index) else {
      return Ok(SubmitOutcome::IgnoredEmpty);
    };
    if answer.is_empty() {
      return Ok(SubmitOutcome::IgnoredEmpty);
    }
    if self.revealed.contains_key(&exercise.exercise_id) {
      return Ok(SubmitOutcome::Locked);
    }
    if !exercise.key.fits(&answer) {
      return Err(SessionError::AnswerShapeMismatch);
    }
    self.answers.insert(exercise.exercise_id.clone(), answer);
    Ok(SubmitOutcome::Stored)
  }

  /// Judge the stored answer. Repeated calls return the same feedback and
  /// never add points twice. `None` when nothing has been submitted.
  pub fn check_answer(&mut self) -> Result<Option<Feedback>, SessionError> {
    self.require_exercises()?;
    let Some(exercise) = self.lesson.content.exercises.get(self.exercise_index) else {
      return Ok(None);
    };

    if let Some(&correct) = self.revealed.get(&exercise.exercise_id) {
      return Ok(Some(Feedback::for_exercise(exercise, correct)));
    }
    let Some(answer) = self.answers.get(&exercise.exercise_id) else {
      return Ok(None);
    };

    let correct = exercise.is_correct(answer);
    if correct {
      self.points_earned += exercise.points;
    }
    self.revealed.insert(exercise.exercise_id.clone(), correct);
    tracing::debug!(
      "Lesson {}: exercise {} checked (correct: {})",
      self.lesson.lesson_id,
      exercise.exercise_id,
      correct
    );
    Ok(Some(Feedback::for_exercise(exercise, correct)))
  }

  /// Move to the next exercise, or complete the lesson after the last one
  pub fn next_exercise(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
    self.require_exercises()?;
    let count = self.exercise_count();
    if let Some(exercise) = self.lesson.content.exercises.get(self.exercise_index) {
      if !self.revealed.contains_key(&exercise.exercise_id) {
        return Err(SessionError::NotRevealed);
      }
    }

    if self.exercise_index + 1 < count {
      self.exercise_index += 1;
      return Ok(Advance::Next(self.exercise_index));
    }

    self.stage = Stage::Complete;
    let progress = self.finalize(now);
    Ok(Advance::Completed(progress))
  }

  fn finalize(&mut self, now: DateTime<Utc>) -> UserProgress {
    if let Some(existing) = &self.progress {
      return existing.clone();
    }

    let time_spent = (now - self.started_at).num_seconds().max(0) as u64;
    let possible = self.points_possible();
    let score = if possible == 0 {
      0.0
    } else {
      100.0 * self.points_earned as f64 / possible as f64
    };
    let total = self.exercise_count() as u32;
    let progress = UserProgress::new(&self.user_id, &self.lesson.lesson_id, score, now, time_spent, total);
    tracing::debug!(
      "Lesson {} complete for user {}: score {:.2}, {}s",
      self.lesson.lesson_id,
      self.user_id,
      score,
      time_spent
    );
    self.progress = Some(progress.clone());
    progress
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::StaticCatalog;
  use crate::domain::{round_score, AnswerKey, Category, Difficulty, LessonContent, TargetLanguage};
  use chrono::Duration;

  fn exercise(id: &str, key: AnswerKey, points: u32) -> Exercise {
    Exercise {
      exercise_id: id.to_string(),
      prompt: format!("Prompt {}", id),
      options: None,
      explanation: Some(format!("Because {}", id)),
      points,
      key,
    }
  }

  fn lesson(exercises: Vec<Exercise>) -> Lesson {
    Lesson {
      lesson_id: "L100".to_string(),
      title: "Test".to_string(),
      description: "Test lesson".to_string(),
      difficulty: Difficulty::Beginner,
      category: Category::Food,
      target_language: TargetLanguage::Kinyarwanda,
      audience: None,
      duration: 10,
      vocabulary_count: 0,
      thumbnail: None,
      content: LessonContent {
        vocabulary: vec![],
        phrases: vec![],
        cultural_notes: None,
        exercises,
      },
    }
  }

  fn two_exercise_lesson() -> Lesson {
    lesson(vec![
      exercise("E1", AnswerKey::MultipleChoice("Bisi".into()), 10),
      exercise("E2", AnswerKey::Matching(vec!["Rice".into(), "Meat".into()]), 20),
    ])
  }

  fn at_exercises(lesson: Lesson, now: DateTime<Utc>) -> LessonSession {
    let mut s = LessonSession::new(lesson, "u1", now);
    s.continue_stage().unwrap();
    s.continue_stage().unwrap();
    s.continue_stage().unwrap();
    s
  }

  #[test]
  fn test_start_unknown_lesson() {
    let catalog = StaticCatalog::bundled().unwrap();
    let err = LessonSession::start(&catalog, "L999", "u1", Utc::now()).unwrap_err();
    assert_eq!(err, SessionError::LessonNotFound("L999".to_string()));
  }

  #[test]
  fn test_start_from_catalog() {
    let catalog = StaticCatalog::bundled().unwrap();
    let s = LessonSession::start(&catalog, "L001", "u1", Utc::now()).unwrap();
    assert_eq!(s.stage(), Stage::Vocabulary);
    assert_eq!(s.exercise_count(), 4);
    assert_eq!(s.points_possible(), 55);
  }

  #[test]
  fn test_stage_sequence() {
    let mut s = LessonSession::new(two_exercise_lesson(), "u1", Utc::now());
    assert_eq!(s.continue_stage(), Ok(Stage::Phrases));
    assert_eq!(s.continue_stage(), Ok(Stage::Cultural));
    assert_eq!(s.go_back(), Ok(Stage::Phrases));
    assert_eq!(s.go_back(), Ok(Stage::Vocabulary));
    assert!(matches!(s.go_back(), Err(SessionError::InvalidTransition { from: Stage::Vocabulary, .. })));
    s.continue_stage().unwrap();
    s.continue_stage().unwrap();
    assert_eq!(s.continue_stage(), Ok(Stage::Exercises));
  }

  #[test]
  fn test_no_way_back_from_exercises() {
    let mut s = at_exercises(two_exercise_lesson(), Utc::now());
    assert!(matches!(s.go_back(), Err(SessionError::InvalidTransition { from: Stage::Exercises, .. })));
    assert!(matches!(s.continue_stage(), Err(SessionError::InvalidTransition { .. })));
    assert_eq!(s.stage(), Stage::Exercises);
  }

  #[test]
  fn test_submit_requires_exercise_stage() {
    let mut s = LessonSession::new(two_exercise_lesson(), "u1", Utc::now());
    assert_eq!(
      s.submit_answer(Answer::text("Bisi")),
      Err(SessionError::NotInExercises(Stage::Vocabulary))
    );
    assert_eq!(s.check_answer(), Err(SessionError::NotInExercises(Stage::Vocabulary)));
    assert!(s.current_exercise().is_none());
  }

  #[test]
  fn test_empty_answer_ignored() {
    let mut s = at_exercises(two_exercise_lesson(), Utc::now());
    assert_eq!(s.submit_answer(Answer::text("  ")), Ok(SubmitOutcome::IgnoredEmpty));
    assert!(s.submitted_answer("E1").is_none());
    assert_eq!(s.check_answer(), Ok(None));
    assert!(!s.is_revealed("E1"));
  }

  #[test]
  fn test_shape_mismatch() {
    let mut s = at_exercises(two_exercise_lesson(), Utc::now());
    assert_eq!(
      s.submit_answer(Answer::sequence(["Bisi"])),
      Err(SessionError::AnswerShapeMismatch)
    );
  }

  #[test]
  fn test_answer_replaced_until_revealed() {
    let mut s = at_exercises(two_exercise_lesson(), Utc::now());
    s.submit_answer(Answer::text("Takisi")).unwrap();
    s.submit_answer(Answer::text(" bisi ")).unwrap();
    let fb = s.check_answer().unwrap().unwrap();
    assert!(fb.correct);
    assert_eq!(fb.points_earned, 10);
    assert_eq!(fb.correct_answer, "Bisi");
    assert_eq!(fb.explanation.as_deref(), Some("Because E1"));

    assert_eq!(s.submit_answer(Answer::text("Takisi")), Ok(SubmitOutcome::Locked));
    assert_eq!(s.submitted_answer("E1"), Some(&Answer::text(" bisi ")));
  }

  #[test]
  fn test_check_is_idempotent() {
    let mut s = at_exercises(two_exercise_lesson(), Utc::now());
    s.submit_answer(Answer::text("Bisi")).unwrap();
    let first = s.check_answer().unwrap();
    let second = s.check_answer().unwrap();
    assert_eq!(first, second);
    assert_eq!(s.points_earned(), 10);
    assert_eq!(s.current_feedback(), first);
  }

  #[test]
  fn test_next_requires_reveal() {
    let mut s = at_exercises(two_exercise_lesson(), Utc::now());
    assert_eq!(s.next_exercise(Utc::now()), Err(SessionError::NotRevealed));
    s.submit_answer(Answer::text("Bisi")).unwrap();
    assert_eq!(s.next_exercise(Utc::now()), Err(SessionError::NotRevealed));
    s.check_answer().unwrap();
    assert_eq!(s.next_exercise(Utc::now()), Ok(Advance::Next(1)));
    assert_eq!(s.current_exercise().map(|e| e.exercise_id.as_str()), Some("E2"));
  }

  #[test]
  fn test_partial_score_and_finalization() {
    let start = Utc::now();
    let mut s = at_exercises(two_exercise_lesson(), start);

    s.submit_answer(Answer::text("Takisi")).unwrap();
    assert!(!s.check_answer().unwrap().unwrap().correct);
    s.next_exercise(start).unwrap();

    s.submit_answer(Answer::sequence(["Rice", "Meat"])).unwrap();
    let fb = s.check_answer().unwrap().unwrap();
    assert!(fb.correct);
    assert_eq!(fb.correct_answer, "Rice, Meat");

    let end = start + Duration::milliseconds(95_700);
    let Advance::Completed(progress) = s.next_exercise(end).unwrap() else {
      panic!("expected completion");
    };
    assert_eq!(s.stage(), Stage::Complete);
    assert_eq!(round_score(progress.score), 66.67);
    assert_eq!(progress.time_spent, 95);
    assert_eq!(progress.exercises_completed, 2);
    assert_eq!(progress.total_exercises, 2);
    assert_eq!(progress.user_id, "u1");
    assert_eq!(progress.lesson_id, "L100");
    assert_eq!(s.progress(), Some(&progress));
  }

  #[test]
  fn test_complete_is_terminal() {
    let now = Utc::now();
    let mut s = at_exercises(lesson(vec![exercise("E1", AnswerKey::FillBlank("he".into()), 15)]), now);
    s.submit_answer(Answer::text("he")).unwrap();
    s.check_answer().unwrap();
    let Advance::Completed(p) = s.next_exercise(now).unwrap() else {
      panic!("expected completion");
    };
    assert_eq!(p.score, 100.0);

    assert_eq!(s.next_exercise(now), Err(SessionError::NotInExercises(Stage::Complete)));
    assert!(s.continue_stage().is_err());
    assert!(s.go_back().is_err());
    assert_eq!(s.progress().map(|p| &p.progress_id), Some(&p.progress_id));
  }

  #[test]
  fn test_matching_order_matters() {
    let mut s = at_exercises(
      lesson(vec![exercise("E1", AnswerKey::Matching(vec!["Police".into(), "Doctor".into()]), 20)]),
      Utc::now(),
    );
    s.submit_answer(Answer::sequence(["Doctor", "Police"])).unwrap();
    let fb = s.check_answer().unwrap().unwrap();
    assert!(!fb.correct);
    assert_eq!(fb.points_earned, 0);
  }

  #[test]
  fn test_zero_exercise_lesson() {
    let now = Utc::now();
    let mut s = at_exercises(lesson(vec![]), now);
    assert!(s.current_exercise().is_none());
    assert_eq!(s.check_answer(), Ok(None));
    let Advance::Completed(p) = s.next_exercise(now + Duration::seconds(30)).unwrap() else {
      panic!("expected completion");
    };
    assert_eq!(p.score, 0.0);
    assert_eq!(p.total_exercises, 0);
    assert_eq!(p.time_spent, 30);
  }

  #[test]
  fn test_clock_skew_never_negative() {
    let now = Utc::now();
    let mut s = at_exercises(lesson(vec![]), now);
    let Advance::Completed(p) = s.next_exercise(now - Duration::seconds(10)).unwrap() else {
      panic!("expected completion");
    };
    assert_eq!(p.time_spent, 0);
  }
}
