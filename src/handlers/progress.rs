//! Progress history, statistics, badges and recommendations.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lessons::{LessonSummary, LESSON_NOT_FOUND};
use crate::auth::AuthContext;
use crate::content::badge_catalog;
use crate::domain::{Badge, Category, Difficulty, Lesson, User, UserProgress};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::learning::{category_breakdown, evaluate_badges, recommend, CategoryProgress, UserStats};
use crate::state::AppState;

/// One completion joined with its lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
  pub progress_id: String,
  pub lesson_id: String,
  pub title: String,
  pub category: Category,
  pub difficulty: Difficulty,
  pub score: f64,
  pub completed_at: DateTime<Utc>,
  pub time_spent: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
  /// Newest first
  pub lessons: Vec<LessonProgress>,
  pub stats: UserStats,
}

/// Externally finalized lesson result
#[derive(Debug, Deserialize)]
pub struct NewProgress {
  pub lesson_id: String,
  pub score: f64,
  #[serde(default)]
  pub time_spent: u64,
  pub exercises_completed: u32,
  pub total_exercises: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedLesson {
  pub lesson_id: String,
  pub reason: String,
  pub confidence: f64,
  pub lesson: LessonSummary,
}

/// Everything the progress endpoints compute from, loaded once per request
struct Learner<'a> {
  history: Vec<UserProgress>,
  lessons: Vec<&'a Lesson>,
}

impl<'a> Learner<'a> {
  fn load(state: &'a AppState, user: &User) -> Result<Self, AppError> {
    Ok(Self {
      history: state.progress.load_progress(&user.user_id)?,
      lessons: state.catalog.lessons_for_user(user.user_type, user.target_language),
    })
  }

  fn badges(&self) -> Vec<Badge> {
    evaluate_badges(&self.history, &badge_catalog())
  }

  fn stats(&self) -> UserStats {
    UserStats::compute(&self.history, &self.lessons, self.badges().len(), Utc::now().date_naive())
  }
}

/// GET /api/v1/progress
pub async fn get_progress(
  State(state): State<AppState>,
  auth: AuthContext,
) -> Result<Json<ProgressResponse>, AppError> {
  let learner = Learner::load(&state, &auth.user)?;

  let mut lessons: Vec<LessonProgress> = learner
    .history
    .iter()
    .filter_map(|p| {
      let lesson = state.catalog.find_lesson(&p.lesson_id)?;
      Some(LessonProgress {
        progress_id: p.progress_id.clone(),
        lesson_id: lesson.lesson_id.clone(),
        title: lesson.title.clone(),
        category: lesson.category,
        difficulty: lesson.difficulty,
        score: p.score,
        completed_at: p.completed_at,
        time_spent: p.time_spent,
      })
    })
    .collect();
  // Stable: equal timestamps keep append order, reversed
  lessons.reverse();
  lessons.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

  Ok(Json(ProgressResponse {
    lessons,
    stats: learner.stats(),
  }))
}

/// POST /api/v1/progress
pub async fn record_progress(
  State(state): State<AppState>,
  auth: AuthContext,
  AppJson(body): AppJson<NewProgress>,
) -> Result<(StatusCode, Json<UserProgress>), AppError> {
  if state.catalog.find_lesson(&body.lesson_id).is_none() {
    return Err(AppError::not_found(LESSON_NOT_FOUND));
  }
  if !(0.0..=100.0).contains(&body.score) {
    return Err(AppError::bad_request("Score must be between 0 and 100"));
  }
  if body.exercises_completed > body.total_exercises {
    return Err(AppError::bad_request("Completed exercises cannot exceed total exercises"));
  }

  let mut record = UserProgress::new(
    auth.user_id(),
    &body.lesson_id,
    body.score,
    Utc::now(),
    body.time_spent,
    body.total_exercises,
  );
  record.exercises_completed = body.exercises_completed;

  state.progress.append_progress(&record)?;
  tracing::info!(
    "Progress recorded for user {}: lesson {} scored {:.2}",
    record.user_id,
    record.lesson_id,
    record.score
  );
  Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/progress/stats
pub async fn get_stats(State(state): State<AppState>, auth: AuthContext) -> Result<Json<UserStats>, AppError> {
  Ok(Json(Learner::load(&state, &auth.user)?.stats()))
}

/// GET /api/v1/progress/badges
pub async fn get_earned_badges(State(state): State<AppState>, auth: AuthContext) -> Result<Json<Vec<Badge>>, AppError> {
  Ok(Json(Learner::load(&state, &auth.user)?.badges()))
}

/// GET /api/v1/progress/recommendations
pub async fn get_recommendations(
  State(state): State<AppState>,
  auth: AuthContext,
) -> Result<Json<Vec<RecommendedLesson>>, AppError> {
  let learner = Learner::load(&state, &auth.user)?;
  let recommended = recommend(&learner.history, &learner.lessons)
    .into_iter()
    .filter_map(|r| {
      let lesson = state.catalog.find_lesson(&r.lesson_id)?;
      Some(RecommendedLesson {
        lesson: LessonSummary::new(lesson, Some(false)),
        lesson_id: r.lesson_id,
        reason: r.reason,
        confidence: r.confidence,
      })
    })
    .collect();
  Ok(Json(recommended))
}

/// GET /api/v1/progress/categories
pub async fn get_category_progress(
  State(state): State<AppState>,
  auth: AuthContext,
) -> Result<Json<Vec<CategoryProgress>>, AppError> {
  let learner = Learner::load(&state, &auth.user)?;
  Ok(Json(category_breakdown(&learner.history, &learner.lessons)))
}

/// GET /api/v1/badges
pub async fn list_badges() -> Json<Vec<Badge>> {
  Json(badge_catalog())
}
