use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lesson::{NativeLanguage, TargetLanguage, UserType};

/// Registered learner as returned by the API (never carries the password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id: String,
  pub username: String,
  pub email: String,
  pub user_type: UserType,
  pub target_language: TargetLanguage,
  pub native_language: NativeLanguage,
  pub created_at: DateTime<Utc>,
  pub is_active: bool,
}
