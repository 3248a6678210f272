use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Achievement. The catalog is static; `earned_at` is filled in per learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
  pub badge_id: String,
  pub name: String,
  pub description: String,
  pub icon: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub earned_at: Option<DateTime<Utc>>,
}

impl Badge {
  pub fn earned(&self, at: DateTime<Utc>) -> Self {
    Self {
      earned_at: Some(at),
      ..self.clone()
    }
  }
}
