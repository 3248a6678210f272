//! Authentication handlers for register, login, profile and logout.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::db::{self as auth_db, NewUser, ProfileChanges};
use super::middleware::AuthContext;
use super::password;
use crate::db::{try_lock, LogOnError};
use crate::domain::{NativeLanguage, TargetLanguage, User, UserType};
use crate::error::AppError;
use crate::extract::{AppForm, AppJson};
use crate::state::AppState;
use crate::validation::{self, LoginForm, ValidationError};

pub const LOGIN_FAILED: &str = "Incorrect username or password";
pub const ACCOUNT_DEACTIVATED: &str = "User account is deactivated";
pub const USERNAME_TAKEN: &str = "Username already registered";
pub const EMAIL_TAKEN: &str = "Email already registered";

/// POST /register body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub target_language: String,
    #[serde(default)]
    pub native_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

/// PUT /me body; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub target_language: Option<String>,
    pub native_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn parse_user_type(s: &str) -> Result<UserType, ValidationError> {
    UserType::from_str(s.trim()).ok_or(ValidationError::InvalidUserType)
}

fn parse_target_language(s: &str) -> Result<TargetLanguage, ValidationError> {
    TargetLanguage::from_str(s.trim()).ok_or(ValidationError::InvalidTargetLanguage)
}

fn parse_native_language(s: &str) -> Result<NativeLanguage, ValidationError> {
    NativeLanguage::from_str(s.trim()).ok_or(ValidationError::InvalidNativeLanguage)
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if validation::is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let required = [
        &req.username,
        &req.email,
        &req.password,
        &req.user_type,
        &req.target_language,
        &req.native_language,
    ];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(ValidationError::MissingFields.into());
    }

    let username = req.username.trim();
    let email = req.email.trim();
    validation::validate_username(username)?;
    check_email(email)?;
    validation::validate_password(&req.password)?;
    let new_user = NewUser {
        username,
        email,
        user_type: parse_user_type(&req.user_type)?,
        target_language: parse_target_language(&req.target_language)?,
        native_language: parse_native_language(&req.native_language)?,
    };

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;

    let conn = try_lock(&state.db)?;
    if auth_db::username_exists(&conn, username, None)? {
        return Err(AppError::bad_request(USERNAME_TAKEN));
    }
    if auth_db::email_exists(&conn, email, None)? {
        return Err(AppError::bad_request(EMAIL_TAKEN));
    }

    let user = auth_db::create_user(&conn, &new_user, &password_hash)?;
    tracing::info!("Registered user {} ({})", user.username, user.user_type.as_str());
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/auth/login (form-encoded username and password)
pub async fn login(
    State(state): State<AppState>,
    AppForm(form): AppForm<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    form.validate()?;

    let found = {
        let conn = try_lock(&state.db)?;
        auth_db::get_user_by_username(&conn, form.username.trim())?
    };
    let (user, password_hash) = found.ok_or_else(|| AppError::unauthorized(LOGIN_FAILED))?;

    if !password::verify_password(&form.password, &password_hash) {
        tracing::info!("Failed login for {}", user.username);
        return Err(AppError::unauthorized(LOGIN_FAILED));
    }
    if !user.is_active {
        return Err(AppError::forbidden(ACCOUNT_DEACTIVATED));
    }

    let conn = try_lock(&state.db)?;
    let access_token = auth_db::create_token(&conn, &user.user_id, state.config.token_expiry_hours)?;
    auth_db::update_last_login(&conn, &user.user_id).log_warn("Failed to update last login");

    tracing::info!("User {} logged in", user.username);
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user,
    }))
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthContext) -> Json<User> {
    Json(auth.user)
}

/// PUT /api/v1/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthContext,
    AppJson(update): AppJson<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let mut changes = ProfileChanges::default();

    if let Some(username) = update.username.as_deref().map(str::trim) {
        validation::validate_username(username)?;
        changes.username = Some(username.to_string());
    }
    if let Some(email) = update.email.as_deref().map(str::trim) {
        check_email(email)?;
        changes.email = Some(email.to_string());
    }
    if let Some(language) = update.target_language.as_deref() {
        changes.target_language = Some(parse_target_language(language)?);
    }
    if let Some(language) = update.native_language.as_deref() {
        changes.native_language = Some(parse_native_language(language)?);
    }

    let conn = try_lock(&state.db)?;
    if let Some(username) = &changes.username {
        if auth_db::username_exists(&conn, username, Some(auth.user_id()))? {
            return Err(AppError::bad_request("Username already taken"));
        }
    }
    if let Some(email) = &changes.email {
        if auth_db::email_exists(&conn, email, Some(auth.user_id()))? {
            return Err(AppError::bad_request(EMAIL_TAKEN));
        }
    }

    auth_db::update_profile(&conn, auth.user_id(), &changes)?;
    let user = auth_db::get_user_by_id(&conn, auth.user_id())?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<MessageResponse>, AppError> {
    let conn = try_lock(&state.db)?;
    auth_db::delete_token(&conn, &auth.token)?;
    tracing::info!("User {} logged out", auth.user.username);
    Ok(Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    }))
}

/// GET /api/v1/auth/users
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> Result<Json<Vec<User>>, AppError> {
    let conn = try_lock(&state.db)?;
    Ok(Json(auth_db::get_all_users(&conn)?))
}
