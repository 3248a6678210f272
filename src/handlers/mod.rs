//! JSON API routes.

pub mod chat;
pub mod lessons;
pub mod progress;
pub mod sessions;

use axum::{
  http::HeaderValue,
  routing::{get, post, put},
  Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// Full application router with tracing and CORS applied
pub fn router(state: AppState) -> Router {
  let cors = cors_layer(&state.config.cors_origins);

  Router::new()
    .route("/", get(index))
    .route("/health", get(health))
    .nest(API_PREFIX, api_routes())
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

fn api_routes() -> Router<AppState> {
  let auth_routes = Router::new()
    .route("/register", post(auth::register))
    .route("/login", post(auth::login))
    .route("/me", get(auth::me).put(auth::update_me))
    .route("/logout", post(auth::logout))
    .route("/users", get(auth::list_users));

  let lesson_routes = Router::new()
    .route("/", get(lessons::list_lessons))
    .route("/categories", get(lessons::list_categories))
    .route("/{lesson_id}", get(lessons::get_lesson))
    .route("/{lesson_id}/exercises", get(lessons::get_lesson_exercises))
    .route("/{lesson_id}/submit", post(lessons::submit_exercise));

  let session_routes = Router::new()
    .route("/", post(sessions::start_session))
    .route("/{session_id}", get(sessions::get_session))
    .route("/{session_id}/continue", post(sessions::continue_stage))
    .route("/{session_id}/back", post(sessions::go_back))
    .route("/{session_id}/answer", put(sessions::submit_answer))
    .route("/{session_id}/check", post(sessions::check_answer))
    .route("/{session_id}/next", post(sessions::next_exercise));

  let progress_routes = Router::new()
    .route("/", get(progress::get_progress).post(progress::record_progress))
    .route("/stats", get(progress::get_stats))
    .route("/badges", get(progress::get_earned_badges))
    .route("/recommendations", get(progress::get_recommendations))
    .route("/categories", get(progress::get_category_progress));

  let chat_routes = Router::new()
    .route("/", post(chat::send_message))
    .route("/greeting", get(chat::greeting));

  Router::new()
    .nest("/auth", auth_routes)
    .nest("/lessons", lesson_routes)
    .nest("/sessions", session_routes)
    .nest("/progress", progress_routes)
    .nest("/chat", chat_routes)
    .route("/badges", get(progress::list_badges))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  let origins: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|origin| match origin.parse() {
      Ok(value) => Some(value),
      Err(_) => {
        tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(origins)
    .allow_methods(Any)
    .allow_headers(Any)
}

/// GET /
pub async fn index() -> Json<Value> {
  Json(json!({
    "name": "FluentFusion API",
    "version": env!("CARGO_PKG_VERSION"),
    "docs": API_PREFIX,
  }))
}

/// GET /health
pub async fn health() -> Json<Value> {
  Json(json!({ "status": "healthy" }))
}
