//! Lesson sessions over HTTP.
//!
//! Each request locks the session store only long enough to apply one engine
//! operation. A completed session's progress record is appended to the
//! progress store exactly once, by the request that completed it. When that
//! append fails the session is put back as it was, so the request can be
//! retried.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthContext;
use crate::domain::{Answer, ExerciseView, UserProgress};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::learning::{Advance, Feedback, LessonSession, SessionError, Stage, SubmitOutcome};
use crate::state::AppState;

pub const SESSION_NOT_FOUND: &str = "Session not found";

/// Snapshot of a lesson session for the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
  pub session_id: String,
  pub lesson_id: String,
  pub lesson_title: String,
  pub stage: Stage,
  pub exercise_index: usize,
  pub exercise_count: usize,
  pub points_earned: u32,
  pub points_possible: u32,
  pub started_at: DateTime<Utc>,
  pub current_exercise: Option<ExerciseView>,
  pub submitted_answer: Option<Answer>,
  /// Set once the current exercise has been checked
  pub feedback: Option<Feedback>,
  /// Set once the lesson is complete
  pub progress: Option<UserProgress>,
}

impl SessionView {
  fn new(session_id: &str, session: &LessonSession) -> Self {
    let current = session.current_exercise();
    Self {
      session_id: session_id.to_string(),
      lesson_id: session.lesson().lesson_id.clone(),
      lesson_title: session.lesson().title.clone(),
      stage: session.stage(),
      exercise_index: session.exercise_index(),
      exercise_count: session.exercise_count(),
      points_earned: session.points_earned(),
      points_possible: session.points_possible(),
      started_at: session.started_at(),
      current_exercise: current.map(|e| e.view()),
      submitted_answer: current.and_then(|e| session.submitted_answer(&e.exercise_id)).cloned(),
      feedback: session.current_feedback(),
      progress: session.progress().cloned(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct StartSession {
  pub lesson_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerBody {
  pub answer: Answer,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
  pub outcome: SubmitOutcome,
  pub session: SessionView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
  /// None when no answer was submitted
  pub feedback: Option<Feedback>,
  pub session: SessionView,
}

/// Apply `f` to the caller's session and return its result with a fresh view
fn apply<T, E>(
  state: &AppState,
  auth: &AuthContext,
  session_id: &str,
  f: impl FnOnce(&mut LessonSession) -> Result<T, E>,
) -> Result<(T, SessionView), AppError>
where
  AppError: From<E>,
{
  let result = state
    .sessions
    .with_session(session_id, auth.user_id(), Utc::now(), |session| {
      f(session).map(|value| (value, SessionView::new(session_id, session)))
    })
    .ok_or_else(|| AppError::not_found(SESSION_NOT_FOUND))?;
  Ok(result?)
}

/// POST /api/v1/sessions
pub async fn start_session(
  State(state): State<AppState>,
  auth: AuthContext,
  AppJson(body): AppJson<StartSession>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
  let now = Utc::now();
  let session = LessonSession::start(state.catalog.as_ref(), &body.lesson_id, auth.user_id(), now)?;
  let mut view = SessionView::new("", &session);
  let session_id = state.sessions.insert(session, now);
  view.session_id = session_id;
  Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/sessions/{session_id}
pub async fn get_session(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
  let ((), view) = apply(&state, &auth, &session_id, |_| Ok::<_, SessionError>(()))?;
  Ok(Json(view))
}

/// POST /api/v1/sessions/{session_id}/continue
pub async fn continue_stage(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
  let (_, view) = apply(&state, &auth, &session_id, |s| s.continue_stage())?;
  Ok(Json(view))
}

/// POST /api/v1/sessions/{session_id}/back
pub async fn go_back(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
  let (_, view) = apply(&state, &auth, &session_id, |s| s.go_back())?;
  Ok(Json(view))
}

/// PUT /api/v1/sessions/{session_id}/answer
pub async fn submit_answer(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(session_id): Path<String>,
  AppJson(body): AppJson<AnswerBody>,
) -> Result<Json<AnswerResponse>, AppError> {
  let (outcome, session) = apply(&state, &auth, &session_id, |s| s.submit_answer(body.answer))?;
  Ok(Json(AnswerResponse { outcome, session }))
}

/// POST /api/v1/sessions/{session_id}/check
pub async fn check_answer(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(session_id): Path<String>,
) -> Result<Json<CheckResponse>, AppError> {
  let (feedback, session) = apply(&state, &auth, &session_id, |s| s.check_answer())?;
  Ok(Json(CheckResponse { feedback, session }))
}

/// POST /api/v1/sessions/{session_id}/next
pub async fn next_exercise(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
  let ((), view) = apply(&state, &auth, &session_id, |s| -> Result<(), AppError> {
    let before = s.clone();
    if let Advance::Completed(progress) = s.next_exercise(Utc::now())? {
      if let Err(e) = state.progress.append_progress(&progress) {
        *s = before;
        return Err(AppError::from(e));
      }
      tracing::info!(
        "Progress recorded for user {}: lesson {} scored {:.2}",
        progress.user_id,
        progress.lesson_id,
        progress.score
      );
    }
    Ok(())
  })?;
  Ok(Json(view))
}
