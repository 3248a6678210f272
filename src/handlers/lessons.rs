//! Lesson browsing and single-exercise checking.

use axum::{
  extract::{Path, State},
  Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::auth::{AuthContext, OptionalAuth};
use crate::content::{category_counts, CategoryCount, LessonQuery};
use crate::db::LogOnError;
use crate::domain::{
  Answer, Category, Difficulty, ExerciseView, Lesson, PhraseItem, TargetLanguage, UserType, VocabularyItem,
};
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::learning::Feedback;
use crate::state::AppState;

pub const LESSON_NOT_FOUND: &str = "Lesson not found";
pub const EXERCISE_NOT_FOUND: &str = "Exercise not found";

/// Lesson metadata as listed; `completed` only for signed-in learners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSummary {
  pub lesson_id: String,
  pub title: String,
  pub description: String,
  pub difficulty: Difficulty,
  pub category: Category,
  pub target_language: TargetLanguage,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub audience: Option<UserType>,
  pub duration: u32,
  pub vocabulary_count: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thumbnail: Option<String>,
  pub exercise_count: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub completed: Option<bool>,
}

impl LessonSummary {
  pub fn new(lesson: &Lesson, completed: Option<bool>) -> Self {
    Self {
      lesson_id: lesson.lesson_id.clone(),
      title: lesson.title.clone(),
      description: lesson.description.clone(),
      difficulty: lesson.difficulty,
      category: lesson.category,
      target_language: lesson.target_language,
      audience: lesson.audience,
      duration: lesson.duration,
      vocabulary_count: lesson.vocabulary_count,
      thumbnail: lesson.thumbnail.clone(),
      exercise_count: lesson.exercise_count(),
      completed,
    }
  }
}

/// Lesson content with exercises stripped of their answer keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonContentView {
  pub vocabulary: Vec<VocabularyItem>,
  pub phrases: Vec<PhraseItem>,
  pub cultural_notes: Vec<String>,
  pub exercises: Vec<ExerciseView>,
}

impl LessonContentView {
  pub fn new(lesson: &Lesson) -> Self {
    Self {
      vocabulary: lesson.content.vocabulary.clone(),
      phrases: lesson.content.phrases.clone(),
      cultural_notes: lesson.content.cultural_notes().to_vec(),
      exercises: lesson.content.exercises.iter().map(|e| e.view()).collect(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDetail {
  #[serde(flatten)]
  pub summary: LessonSummary,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<LessonContentView>,
}

#[derive(Debug, Serialize)]
pub struct LessonListResponse {
  pub lessons: Vec<LessonSummary>,
  pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct DetailParams {
  #[serde(default = "default_include_content")]
  pub include_content: bool,
}

fn default_include_content() -> bool {
  true
}

#[derive(Debug, Deserialize)]
pub struct ExerciseSubmission {
  pub exercise_id: String,
  pub answer: Answer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseResult {
  #[serde(flatten)]
  pub feedback: Feedback,
  pub user_answer: Answer,
}

/// Lesson ids the learner has completed at least once
fn completed_lessons(state: &AppState, user_id: &str) -> HashSet<String> {
  state
    .progress
    .load_progress(user_id)
    .log_warn_default("Failed to load progress")
    .into_iter()
    .map(|p| p.lesson_id)
    .collect()
}

/// Requested language, else the learner's, else Kinyarwanda
fn browse_language(requested: Option<TargetLanguage>, auth: &OptionalAuth) -> TargetLanguage {
  requested
    .or_else(|| auth.0.as_ref().map(|a| a.user.target_language))
    .unwrap_or(TargetLanguage::Kinyarwanda)
}

/// GET /api/v1/lessons
pub async fn list_lessons(
  State(state): State<AppState>,
  auth: OptionalAuth,
  AppQuery(mut query): AppQuery<LessonQuery>,
) -> Json<LessonListResponse> {
  query.language = Some(browse_language(query.language, &auth));

  let completed = auth.0.as_ref().map(|a| completed_lessons(&state, a.user_id()));
  let page = query.run(state.catalog.as_ref());
  let lessons = page
    .lessons
    .into_iter()
    .map(|l| LessonSummary::new(l, completed.as_ref().map(|done| done.contains(&l.lesson_id))))
    .collect();

  Json(LessonListResponse { lessons, total: page.total })
}

/// GET /api/v1/lessons/categories
pub async fn list_categories(State(state): State<AppState>, auth: OptionalAuth) -> Json<Vec<CategoryCount>> {
  let language = browse_language(None, &auth);
  Json(category_counts(state.catalog.as_ref(), language))
}

/// GET /api/v1/lessons/{lesson_id}
pub async fn get_lesson(
  State(state): State<AppState>,
  auth: OptionalAuth,
  Path(lesson_id): Path<String>,
  AppQuery(params): AppQuery<DetailParams>,
) -> Result<Json<LessonDetail>, AppError> {
  let lesson = state
    .catalog
    .find_lesson(&lesson_id)
    .ok_or_else(|| AppError::not_found(LESSON_NOT_FOUND))?;

  let completed = auth
    .0
    .as_ref()
    .map(|a| completed_lessons(&state, a.user_id()).contains(&lesson.lesson_id));

  Ok(Json(LessonDetail {
    summary: LessonSummary::new(lesson, completed),
    content: params.include_content.then(|| LessonContentView::new(lesson)),
  }))
}

/// GET /api/v1/lessons/{lesson_id}/exercises
pub async fn get_lesson_exercises(
  State(state): State<AppState>,
  Path(lesson_id): Path<String>,
) -> Result<Json<Vec<ExerciseView>>, AppError> {
  let lesson = state
    .catalog
    .find_lesson(&lesson_id)
    .ok_or_else(|| AppError::not_found(LESSON_NOT_FOUND))?;
  Ok(Json(lesson.content.exercises.iter().map(|e| e.view()).collect()))
}

/// POST /api/v1/lessons/{lesson_id}/submit
pub async fn submit_exercise(
  State(state): State<AppState>,
  _auth: AuthContext,
  Path(lesson_id): Path<String>,
  AppJson(submission): AppJson<ExerciseSubmission>,
) -> Result<Json<ExerciseResult>, AppError> {
  let lesson = state
    .catalog
    .find_lesson(&lesson_id)
    .ok_or_else(|| AppError::not_found(LESSON_NOT_FOUND))?;
  let exercise = lesson
    .content
    .exercises
    .iter()
    .find(|e| e.exercise_id == submission.exercise_id)
    .ok_or_else(|| AppError::not_found(EXERCISE_NOT_FOUND))?;

  if !exercise.key.fits(&submission.answer) {
    return Err(AppError::bad_request("Answer does not fit this exercise type"));
  }

  let correct = exercise.is_correct(&submission.answer);
  Ok(Json(ExerciseResult {
    feedback: Feedback::for_exercise(exercise, correct),
    user_answer: submission.answer,
  }))
}
