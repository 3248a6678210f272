//! Schema and version-gated migrations.
//!
//! Each migration checks the recorded version, runs inside a transaction and
//! records its own version in `db_version`, so it runs exactly once. New
//! databases run every migration in order.

use chrono::Utc;
use rusqlite::{params, Connection, Result};

/// Latest schema version. Increment when adding a migration.
pub const DB_VERSION: i32 = 2;

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS db_version (
      version INTEGER PRIMARY KEY,
      applied_at TEXT NOT NULL,
      description TEXT
    );
    "#,
  )?;

  let current_version = get_schema_version(conn)?;
  tracing::debug!("Database schema version: {}", current_version);

  if current_version < 1 {
    migrate_v0_to_v1(conn)?;
  }
  if current_version < 2 {
    migrate_v1_to_v2(conn)?;
  }

  Ok(())
}

/// v0→v1: users and bearer tokens
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v0→v1: Create users and auth_tokens");

  let tx = conn.unchecked_transaction()?;
  tx.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS users (
      user_id TEXT PRIMARY KEY,
      username TEXT NOT NULL UNIQUE COLLATE NOCASE,
      email TEXT NOT NULL UNIQUE COLLATE NOCASE,
      password_hash TEXT NOT NULL,
      user_type TEXT NOT NULL,
      target_language TEXT NOT NULL,
      native_language TEXT NOT NULL,
      is_active INTEGER NOT NULL DEFAULT 1,
      created_at TEXT NOT NULL,
      last_login_at TEXT
    );

    CREATE TABLE IF NOT EXISTS auth_tokens (
      token_hash TEXT PRIMARY KEY,
      user_id TEXT NOT NULL,
      created_at TEXT NOT NULL,
      expires_at TEXT NOT NULL,
      FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_auth_tokens_user_id ON auth_tokens(user_id);
    CREATE INDEX IF NOT EXISTS idx_auth_tokens_expires_at ON auth_tokens(expires_at);
    "#,
  )?;

  record_version(&tx, 1, "Create users and auth_tokens")?;
  tx.commit()
}

/// v1→v2: append-only lesson completion records
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
  tracing::info!("Running migration v1→v2: Create user_progress");

  let tx = conn.unchecked_transaction()?;
  tx.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS user_progress (
      seq INTEGER PRIMARY KEY AUTOINCREMENT,
      progress_id TEXT NOT NULL UNIQUE,
      user_id TEXT NOT NULL,
      lesson_id TEXT NOT NULL,
      score REAL NOT NULL,
      completed_at TEXT NOT NULL,
      time_spent INTEGER NOT NULL,
      exercises_completed INTEGER NOT NULL,
      total_exercises INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_user_progress_user_id ON user_progress(user_id);
    "#,
  )?;

  record_version(&tx, 2, "Create user_progress")?;
  tx.commit()
}

/// Record a schema version after successful migration
fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
  let now = Utc::now().to_rfc3339();
  conn.execute(
    "INSERT INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
    params![version, now, description],
  )?;
  tracing::info!("Recorded schema version {} - {}", version, description);
  Ok(())
}

/// Current schema version (0 if no versions recorded)
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
  conn.query_row("SELECT COALESCE(MAX(version), 0) FROM db_version", [], |row| row.get(0))
}
