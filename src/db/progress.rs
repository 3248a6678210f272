//! Progress store port and its implementations.
//!
//! Records are append-only: a learner's history is loaded in append order
//! (newest last) and new records are added one at a time. No caller ever
//! rewrites the whole list.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{try_lock, DbLockError, DbPool};
use crate::domain::UserProgress;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error(transparent)]
  Database(#[from] rusqlite::Error),
  #[error(transparent)]
  Lock(#[from] DbLockError),
}

/// Persistence for lesson completion records.
pub trait ProgressStore: Send + Sync {
  /// Every record for the user, oldest first
  fn load_progress(&self, user_id: &str) -> Result<Vec<UserProgress>, StoreError>;

  fn append_progress(&self, record: &UserProgress) -> Result<(), StoreError>;
}

/// SQLite-backed store sharing the application connection.
#[derive(Clone)]
pub struct SqliteProgressStore {
  pool: DbPool,
}

impl SqliteProgressStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }
}

impl ProgressStore for SqliteProgressStore {
  fn load_progress(&self, user_id: &str) -> Result<Vec<UserProgress>, StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(load_progress(&conn, user_id)?)
  }

  fn append_progress(&self, record: &UserProgress) -> Result<(), StoreError> {
    let conn = try_lock(&self.pool)?;
    Ok(insert_progress(&conn, record)?)
  }
}

fn row_to_progress(row: &Row) -> rusqlite::Result<UserProgress> {
  let completed_at: String = row.get(4)?;
  let completed_at = DateTime::parse_from_rfc3339(&completed_at)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;
  Ok(UserProgress {
    progress_id: row.get(0)?,
    user_id: row.get(1)?,
    lesson_id: row.get(2)?,
    score: row.get(3)?,
    completed_at,
    time_spent: row.get::<_, i64>(5)?.max(0) as u64,
    exercises_completed: row.get(6)?,
    total_exercises: row.get(7)?,
  })
}

pub fn load_progress(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<UserProgress>> {
  let mut stmt = conn.prepare(
    r#"SELECT progress_id, user_id, lesson_id, score, completed_at, time_spent,
              exercises_completed, total_exercises
       FROM user_progress
       WHERE user_id = ?1
       ORDER BY seq"#,
  )?;
  let records = stmt
    .query_map(params![user_id], row_to_progress)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(records)
}

pub fn insert_progress(conn: &Connection, record: &UserProgress) -> rusqlite::Result<()> {
  conn.execute(
    r#"INSERT INTO user_progress
         (progress_id, user_id, lesson_id, score, completed_at, time_spent,
          exercises_completed, total_exercises)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
    params![
      record.progress_id,
      record.user_id,
      record.lesson_id,
      record.score,
      record.completed_at.to_rfc3339(),
      record.time_spent as i64,
      record.exercises_completed,
      record.total_exercises,
    ],
  )?;
  Ok(())
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryProgressStore {
  records: Mutex<HashMap<String, Vec<UserProgress>>>,
}

impl MemoryProgressStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ProgressStore for MemoryProgressStore {
  fn load_progress(&self, user_id: &str) -> Result<Vec<UserProgress>, StoreError> {
    let records = self.records.lock().map_err(|_| DbLockError)?;
    Ok(records.get(user_id).cloned().unwrap_or_default())
  }

  fn append_progress(&self, record: &UserProgress) -> Result<(), StoreError> {
    let mut records = self.records.lock().map_err(|_| DbLockError)?;
    records.entry(record.user_id.clone()).or_default().push(record.clone());
    Ok(())
  }
}
