//! Authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use super::db as auth_db;
use super::handlers::ACCOUNT_DEACTIVATED;
use crate::db::try_lock;
use crate::domain::User;
use crate::error::AppError;
use crate::state::AppState;

pub const CREDENTIALS_ERROR: &str = "Could not validate credentials";

/// Authenticated request context.
/// Add this as a handler parameter to require a valid bearer token.
/// Rejects with 401 otherwise, and with 403 for a deactivated account.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    /// The bearer token presented with the request
    pub token: String,
}

impl AuthContext {
    pub fn user_id(&self) -> &str {
        &self.user.user_id
    }
}

/// Token from an `Authorization: Bearer <token>` header
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized(CREDENTIALS_ERROR).into_response())?
            .to_string();

        let conn = try_lock(&state.db).map_err(|e| AppError::from(e).into_response())?;
        let user = auth_db::get_token_user(&conn, &token)
            .map_err(|e| AppError::from(e).into_response())?
            .ok_or_else(|| AppError::unauthorized(CREDENTIALS_ERROR).into_response())?;
        if !user.is_active {
            return Err(AppError::forbidden(ACCOUNT_DEACTIVATED).into_response());
        }

        Ok(AuthContext { user, token })
    }
}

/// Optional authentication extractor.
/// Returns Some(AuthContext) if authenticated, None otherwise.
/// Use for endpoints that work both with and without authentication.
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthContext::from_request_parts(parts, state).await {
            Ok(auth) => Ok(OptionalAuth(Some(auth))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
