//! Application state shared by all handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::content::LessonCatalog;
use crate::db::{DbPool, ProgressStore, SqliteProgressStore};
use crate::session::SessionStore;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Users and auth tokens
    pub db: DbPool,

    pub catalog: Arc<dyn LessonCatalog>,

    /// Lesson completion history
    pub progress: Arc<dyn ProgressStore>,

    /// Lesson sessions in flight
    pub sessions: SessionStore,

    pub config: Arc<AppConfig>,
}

impl AppState {
    /// State with progress kept in the same SQLite database as users
    pub fn new(db: DbPool, catalog: Arc<dyn LessonCatalog>, config: AppConfig) -> Self {
        let progress = Arc::new(SqliteProgressStore::new(db.clone()));
        Self::with_progress_store(db, catalog, progress, config)
    }

    pub fn with_progress_store(
        db: DbPool,
        catalog: Arc<dyn LessonCatalog>,
        progress: Arc<dyn ProgressStore>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            catalog,
            progress,
            sessions: SessionStore::new(config.session_expiry_hours),
            config: Arc::new(config),
        }
    }
}
