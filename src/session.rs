//! In-memory storage for lesson sessions.
//!
//! Sessions are keyed by a random ID handed to the client and belong to the
//! user who started them. Entries expire after a configurable period of
//! inactivity; expired entries are swept on a fraction of accesses.

use crate::config;
use crate::learning::LessonSession;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Session entry with last access time for expiration
struct SessionEntry {
  session: LessonSession,
  last_access: DateTime<Utc>,
}

/// Shared lesson session store
#[derive(Clone)]
pub struct SessionStore {
  sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
  expiry: Duration,
}

impl SessionStore {
  pub fn new(expiry_hours: i64) -> Self {
    Self {
      sessions: Arc::new(Mutex::new(HashMap::new())),
      expiry: Duration::hours(expiry_hours),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
    entry.last_access <= now - self.expiry
  }

  /// Store a new session and return its ID
  pub fn insert(&self, session: LessonSession, now: DateTime<Utc>) -> String {
    let mut sessions = self.lock();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      self.cleanup_expired(&mut sessions, now);
    }

    let mut session_id = generate_session_id();
    while sessions.contains_key(&session_id) {
      session_id = generate_session_id();
    }
    sessions.insert(session_id.clone(), SessionEntry { session, last_access: now });
    session_id
  }

  /// Run `f` against the user's live session. `None` when the session is
  /// unknown, expired, or owned by someone else.
  pub fn with_session<T>(
    &self,
    session_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
    f: impl FnOnce(&mut LessonSession) -> T,
  ) -> Option<T> {
    let mut sessions = self.lock();

    let expired = match sessions.get(session_id) {
      Some(entry) => self.is_expired(entry, now),
      None => return None,
    };
    if expired {
      sessions.remove(session_id);
      return None;
    }

    let entry = sessions.get_mut(session_id)?;
    if entry.session.user_id() != user_id {
      return None;
    }
    entry.last_access = now;
    Some(f(&mut entry.session))
  }

  pub fn remove(&self, session_id: &str) {
    self.lock().remove(session_id);
  }

  /// Number of stored sessions, expired ones included until swept
  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drop every expired session now
  pub fn sweep(&self, now: DateTime<Utc>) -> usize {
    let mut sessions = self.lock();
    let before = sessions.len();
    self.cleanup_expired(&mut sessions, now);
    before - sessions.len()
  }

  /// Clean up expired sessions
  fn cleanup_expired(&self, sessions: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) {
    let cutoff = now - self.expiry;
    sessions.retain(|_, entry| entry.last_access > cutoff);
  }
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
