//! Credential persistence and session restore.

use std::sync::{Mutex, PoisonError};

use super::http::{AuthApi, ClientError};
use crate::auth::{RegisterRequest, TokenResponse};
use crate::domain::User;
use crate::validation::{LoginForm, RegistrationForm};

/// Where the client keeps its bearer token between runs
pub trait CredentialStore: Send + Sync {
    fn load_token(&self) -> Option<String>;
    fn save_token(&self, token: &str);
    fn clear_token(&self);
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load_token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn save_token(&self, token: &str) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear_token(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Resume a previous login.
///
/// No stored token gives `Ok(None)`. A token the server rejects is stale: it
/// is cleared and `Ok(None)` returned. Transport failures are errors and
/// leave the token in place.
pub async fn restore_session<A, S>(api: &A, store: &S) -> Result<Option<User>, ClientError>
where
    A: AuthApi,
    S: CredentialStore + ?Sized,
{
    let Some(token) = store.load_token() else {
        return Ok(None);
    };
    match api.current_user(&token).await {
        Ok(user) => Ok(Some(user)),
        Err(ClientError::Remote { status, message }) => {
            tracing::info!("Discarding stale credentials ({}: {})", status, message);
            store.clear_token();
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Validate the form, then register. No request is sent for an invalid form.
pub async fn register_with_form<A: AuthApi>(api: &A, form: &RegistrationForm) -> Result<User, ClientError> {
    form.validate()?;
    let request = RegisterRequest {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password.clone(),
        user_type: form.user_type.clone(),
        target_language: form.target_language.clone(),
        native_language: form.native_language.clone(),
    };
    api.register(&request).await
}

/// Validate the form, log in and remember the token
pub async fn login_with_form<A, S>(api: &A, store: &S, form: &LoginForm) -> Result<TokenResponse, ClientError>
where
    A: AuthApi,
    S: CredentialStore + ?Sized,
{
    form.validate()?;
    let response = api.login(form.username.trim(), &form.password).await?;
    store.save_token(&response.access_token);
    Ok(response)
}

/// Revoke the token server-side when possible; local credentials are cleared either way
pub async fn logout<A, S>(api: &A, store: &S)
where
    A: AuthApi,
    S: CredentialStore + ?Sized,
{
    if let Some(token) = store.load_token() {
        if let Err(e) = api.logout(&token).await {
            tracing::warn!("Logout request failed, clearing local credentials anyway: {}", e);
        }
    }
    store.clear_token();
}
