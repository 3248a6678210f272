//! Test utilities for application setup.
//!
//! Builds the real state (migrated in-memory database, bundled catalog) so
//! tests exercise the same schema and routes as production.

use axum::Router;
use std::sync::Arc;

use crate::auth::db::{self as auth_db, NewUser};
use crate::auth::password;
use crate::config::AppConfig;
use crate::content::StaticCatalog;
use crate::db::{init_memory_db, try_lock, ProgressStore};
use crate::domain::{NativeLanguage, TargetLanguage, User, UserType};
use crate::handlers;
use crate::state::AppState;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Application state over a fresh in-memory database.
pub struct TestEnv {
    pub state: AppState,
}

impl TestEnv {
    pub fn new() -> TestResult<Self> {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> TestResult<Self> {
        let db = init_memory_db()?;
        let catalog = Arc::new(StaticCatalog::bundled()?);
        Ok(Self {
            state: AppState::new(db, catalog, config),
        })
    }

    /// Same database and catalog, with progress kept in `progress`
    pub fn with_progress_store(progress: Arc<dyn ProgressStore>) -> TestResult<Self> {
        let db = init_memory_db()?;
        let catalog = Arc::new(StaticCatalog::bundled()?);
        Ok(Self {
            state: AppState::with_progress_store(db, catalog, progress, AppConfig::default()),
        })
    }

    /// Router with every route and layer, sharing this state
    pub fn router(&self) -> Router {
        handlers::router(self.state.clone())
    }

    /// Insert an account directly and issue it a token
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        user_type: UserType,
        target_language: TargetLanguage,
    ) -> TestResult<(User, String)> {
        let hash = password::hash_password(password).map_err(|e| e.to_string())?;
        let email = format!("{}@example.com", username);
        let new_user = NewUser {
            username,
            email: &email,
            user_type,
            target_language,
            native_language: NativeLanguage::English,
        };

        let conn = try_lock(&self.state.db)?;
        let user = auth_db::create_user(&conn, &new_user, &hash)?;
        let token = auth_db::create_token(&conn, &user.user_id, self.state.config.token_expiry_hours)?;
        Ok((user, token))
    }

    /// Tourist learning Kinyarwanda
    pub fn tourist(&self, username: &str) -> TestResult<(User, String)> {
        self.create_user(username, "murakoze123", UserType::Tourist, TargetLanguage::Kinyarwanda)
    }
}
