//! Input validation: answer normalization and the registration / login / profile
//! checks that run before any database or network call.

use serde::{Deserialize, Serialize};

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validation failure. The message is shown to the learner as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
  #[error("Please fill in all fields")]
  MissingFields,
  #[error("Passwords do not match")]
  PasswordMismatch,
  #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
  PasswordTooShort,
  #[error("Invalid email address")]
  InvalidEmail,
  #[error("Username may only contain letters, digits, '_', '-' and '.'")]
  InvalidUsername,
  #[error("User type must be 'tourist' or 'tourism_worker'")]
  InvalidUserType,
  #[error("Target language must be one of: kinyarwanda, english, french")]
  InvalidTargetLanguage,
  #[error("Native language must be one of: kinyarwanda, english, french, swahili, other")]
  InvalidNativeLanguage,
}

// ============================================================================
// Answers
// ============================================================================

/// Trim and lowercase for comparison
pub fn normalize_answer(s: &str) -> String {
  s.trim().to_lowercase()
}

/// Case-insensitive, whitespace-trimmed equality
pub fn answers_match(given: &str, expected: &str) -> bool {
  normalize_answer(given) == normalize_answer(expected)
}

// ============================================================================
// Account fields
// ============================================================================

/// Minimal structural email check: one '@', non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
  let email = email.trim();
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.contains('@')
    && !email.contains(char::is_whitespace)
    && domain.split('.').count() >= 2
    && domain.split('.').all(|part| !part.is_empty())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
  let username = username.trim();
  if username.is_empty() {
    return Err(ValidationError::MissingFields);
  }
  if !username.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')) {
    return Err(ValidationError::InvalidUsername);
  }
  Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ValidationError::PasswordTooShort);
  }
  Ok(())
}

/// Registration form as filled in by the learner, checked before submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationForm {
  pub username: String,
  pub email: String,
  pub password: String,
  pub confirm_password: String,
  pub user_type: String,
  pub target_language: String,
  pub native_language: String,
}

impl RegistrationForm {
  /// Checks run in the order the learner sees the messages
  pub fn validate(&self) -> Result<(), ValidationError> {
    let required = [
      &self.username,
      &self.email,
      &self.password,
      &self.confirm_password,
      &self.user_type,
      &self.target_language,
      &self.native_language,
    ];
    if required.iter().any(|f| f.trim().is_empty()) {
      return Err(ValidationError::MissingFields);
    }
    if self.password != self.confirm_password {
      return Err(ValidationError::PasswordMismatch);
    }
    validate_password(&self.password)?;
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
}

impl LoginForm {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.username.trim().is_empty() || self.password.is_empty() {
      return Err(ValidationError::MissingFields);
    }
    Ok(())
  }
}
