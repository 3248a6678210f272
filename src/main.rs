use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fluent_fusion::auth::db as auth_db;
use fluent_fusion::config::AppConfig;
use fluent_fusion::content::{LessonCatalog, StaticCatalog};
use fluent_fusion::db::{self, LogOnError};
use fluent_fusion::handlers;
use fluent_fusion::state::AppState;

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fluent_fusion=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::load();

  let pool = db::init_db(&config.database_path).expect("Failed to initialize database");
  {
    let conn = db::try_lock(&pool).expect("Database lock failed during startup");
    if let Some(removed) = auth_db::cleanup_expired_tokens(&conn).log_warn("Failed to clean up expired tokens") {
      tracing::info!("Removed {} expired auth tokens", removed);
    }
  }

  let catalog = StaticCatalog::load(config.catalog_path.as_deref())
    .expect("Failed to load lesson catalog");
  tracing::info!("Loaded {} lessons", catalog.lessons().len());

  let bind_addr = config.bind_addr();
  let state = AppState::new(pool, Arc::new(catalog), config);
  let app = handlers::router(state);

  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
