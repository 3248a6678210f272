//! Practice tutor endpoints.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthContext;
use crate::chat;
use crate::error::AppError;
use crate::extract::AppJson;

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
  #[serde(default)]
  pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
  pub reply: String,
  /// Suggested pause before showing the reply
  pub typing_delay_ms: u64,
}

/// GET /api/v1/chat/greeting
pub async fn greeting(auth: AuthContext) -> Json<ChatReply> {
  Json(ChatReply {
    reply: chat::greeting(auth.user.target_language),
    typing_delay_ms: 0,
  })
}

/// POST /api/v1/chat
pub async fn send_message(auth: AuthContext, AppJson(body): AppJson<ChatMessage>) -> Result<Json<ChatReply>, AppError> {
  if body.message.trim().is_empty() {
    return Err(AppError::bad_request("Message cannot be empty"));
  }

  let mut rng = rand::rng();
  Ok(Json(ChatReply {
    reply: chat::respond(&body.message, auth.user.target_language, &mut rng),
    typing_delay_ms: chat::typing_delay(&mut rng),
  }))
}
