//! Auth database operations (users and auth_tokens tables).
//!
//! Bearer tokens are never stored in plaintext: the row key is the SHA-256
//! hex digest of the token handed to the client.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use rusqlite::{params, Connection, Result, Row};
use sha2::{Digest, Sha256};

use crate::domain::{NativeLanguage, TargetLanguage, User, UserType};

/// Length of a bearer token handed to clients
pub const TOKEN_LENGTH: usize = 32;

const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const USER_COLUMNS: &str =
    "user_id, username, email, user_type, target_language, native_language, created_at, is_active";

const JOINED_USER_COLUMNS: &str = "u.user_id, u.username, u.email, u.user_type, u.target_language, \
     u.native_language, u.created_at, u.is_active";

/// Fields needed to create an account (already validated)
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub user_type: UserType,
    pub target_language: TargetLanguage,
    pub native_language: NativeLanguage,
}

/// Partial profile update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub target_language: Option<TargetLanguage>,
    pub native_language: Option<NativeLanguage>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn row_to_user(row: &Row) -> Result<User> {
    let user_type: String = row.get(3)?;
    let target_language: String = row.get(4)?;
    let native_language: String = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        user_type: UserType::from_str(&user_type)
            .ok_or_else(|| conversion_error(3, format!("unknown user type '{}'", user_type)))?,
        target_language: TargetLanguage::from_str(&target_language).ok_or_else(|| {
            conversion_error(4, format!("unknown target language '{}'", target_language))
        })?,
        native_language: NativeLanguage::from_str(&native_language).ok_or_else(|| {
            conversion_error(5, format!("unknown native language '{}'", native_language))
        })?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(6, e.to_string()))?,
        is_active: row.get(7)?,
    })
}

fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

// ============================================================
// USERS
// ============================================================

/// Insert a new active user and return it
pub fn create_user(conn: &Connection, new_user: &NewUser, password_hash: &str) -> Result<User> {
    let user = User {
        user_id: uuid::Uuid::new_v4().to_string(),
        username: new_user.username.to_string(),
        email: new_user.email.to_string(),
        user_type: new_user.user_type,
        target_language: new_user.target_language,
        native_language: new_user.native_language,
        created_at: Utc::now(),
        is_active: true,
    };
    conn.execute(
        r#"INSERT INTO users
             (user_id, username, email, password_hash, user_type, target_language,
              native_language, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)"#,
        params![
            user.user_id,
            user.username,
            user.email,
            password_hash,
            user.user_type.as_str(),
            user.target_language.as_str(),
            user.native_language.as_str(),
            timestamp(user.created_at),
        ],
    )?;
    Ok(user)
}

/// User and stored password hash, matched case-insensitively on username
pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<(User, String)>> {
    let sql = format!("SELECT {}, password_hash FROM users WHERE username = ?1", USER_COLUMNS);
    optional(conn.query_row(&sql, params![username], |row| {
        Ok((row_to_user(row)?, row.get(8)?))
    }))
}

pub fn get_user_by_id(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS);
    optional(conn.query_row(&sql, params![user_id], row_to_user))
}

/// Whether another account already uses this username
pub fn username_exists(conn: &Connection, username: &str, except_user_id: Option<&str>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1 AND user_id IS NOT ?2",
        params![username, except_user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Whether another account already uses this email
pub fn email_exists(conn: &Connection, email: &str, except_user_id: Option<&str>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1 AND user_id IS NOT ?2",
        params![email, except_user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_profile(conn: &Connection, user_id: &str, changes: &ProfileChanges) -> Result<()> {
    conn.execute(
        r#"UPDATE users SET
             username = COALESCE(?2, username),
             email = COALESCE(?3, email),
             target_language = COALESCE(?4, target_language),
             native_language = COALESCE(?5, native_language)
           WHERE user_id = ?1"#,
        params![
            user_id,
            changes.username,
            changes.email,
            changes.target_language.map(|l| l.as_str()),
            changes.native_language.map(|l| l.as_str()),
        ],
    )?;
    Ok(())
}

pub fn set_user_active(conn: &Connection, user_id: &str, active: bool) -> Result<()> {
    conn.execute(
        "UPDATE users SET is_active = ?1 WHERE user_id = ?2",
        params![active, user_id],
    )?;
    Ok(())
}

pub fn update_last_login(conn: &Connection, user_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_login_at = ?1 WHERE user_id = ?2",
        params![timestamp(Utc::now()), user_id],
    )?;
    Ok(())
}

pub fn get_all_users(conn: &Connection) -> Result<Vec<User>> {
    let sql = format!("SELECT {} FROM users ORDER BY created_at, username", USER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt.query_map([], row_to_user)?.collect::<Result<Vec<_>>>()?;
    Ok(users)
}

// ============================================================
// TOKENS
// ============================================================

/// Random alphanumeric bearer token
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// SHA-256 hex digest used as the stored token key
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Issue a token for the user, valid for `expiry_hours`. Returns the plaintext token.
pub fn create_token(conn: &Connection, user_id: &str, expiry_hours: i64) -> Result<String> {
    let token = generate_token();
    let now = Utc::now();
    let expires = now + Duration::hours(expiry_hours);
    conn.execute(
        "INSERT INTO auth_tokens (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![hash_token(&token), user_id, timestamp(now), timestamp(expires)],
    )?;
    Ok(token)
}

/// Owner of an unexpired token
pub fn get_token_user(conn: &Connection, token: &str) -> Result<Option<User>> {
    let sql = format!(
        r#"SELECT {}
           FROM auth_tokens t
           JOIN users u ON u.user_id = t.user_id
           WHERE t.token_hash = ?1 AND t.expires_at > ?2"#,
        JOINED_USER_COLUMNS
    );
    optional(conn.query_row(&sql, params![hash_token(token), timestamp(Utc::now())], row_to_user))
}

pub fn delete_token(conn: &Connection, token: &str) -> Result<()> {
    conn.execute("DELETE FROM auth_tokens WHERE token_hash = ?1", params![hash_token(token)])?;
    Ok(())
}

/// Remove expired tokens, returning how many were deleted
pub fn cleanup_expired_tokens(conn: &Connection) -> Result<usize> {
    conn.execute(
        "DELETE FROM auth_tokens WHERE expires_at <= ?1",
        params![timestamp(Utc::now())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn new_user<'a>(username: &'a str, email: &'a str) -> NewUser<'a> {
        NewUser {
            username,
            email,
            user_type: UserType::Tourist,
            target_language: TargetLanguage::Kinyarwanda,
            native_language: NativeLanguage::English,
        }
    }

    #[test]
    fn test_create_and_lookup_user() {
        let conn = setup();
        let user = create_user(&conn, &new_user("amani", "amani@example.com"), "hash").unwrap();
        assert_eq!(user.user_id.len(), 36);
        assert!(user.is_active);

        let (found, hash) = get_user_by_username(&conn, "AMANI").unwrap().unwrap();
        assert_eq!(found.user_id, user.user_id);
        assert_eq!(found.user_type, UserType::Tourist);
        assert_eq!(hash, "hash");

        assert_eq!(get_user_by_id(&conn, &user.user_id).unwrap().unwrap().email, "amani@example.com");
        assert!(get_user_by_username(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn test_uniqueness_checks() {
        let conn = setup();
        let user = create_user(&conn, &new_user("amani", "amani@example.com"), "hash").unwrap();

        assert!(username_exists(&conn, "Amani", None).unwrap());
        assert!(!username_exists(&conn, "amani", Some(&user.user_id)).unwrap());
        assert!(email_exists(&conn, "AMANI@example.com", None).unwrap());
        assert!(!email_exists(&conn, "other@example.com", None).unwrap());

        let duplicate = create_user(&conn, &new_user("amani", "x@example.com"), "hash");
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_update_profile() {
        let conn = setup();
        let user = create_user(&conn, &new_user("amani", "amani@example.com"), "hash").unwrap();
        let changes = ProfileChanges {
            email: Some("new@example.com".to_string()),
            native_language: Some(NativeLanguage::Swahili),
            ..Default::default()
        };
        update_profile(&conn, &user.user_id, &changes).unwrap();

        let updated = get_user_by_id(&conn, &user.user_id).unwrap().unwrap();
        assert_eq!(updated.username, "amani");
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.native_language, NativeLanguage::Swahili);
        assert_eq!(updated.target_language, TargetLanguage::Kinyarwanda);
    }

    #[test]
    fn test_token_lifecycle() {
        let conn = setup();
        let user = create_user(&conn, &new_user("amani", "amani@example.com"), "hash").unwrap();

        let token = create_token(&conn, &user.user_id, 24).unwrap();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        let stored: String = conn
            .query_row("SELECT token_hash FROM auth_tokens", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, hash_token(&token));
        assert_ne!(stored, token);

        assert_eq!(get_token_user(&conn, &token).unwrap().unwrap().user_id, user.user_id);
        delete_token(&conn, &token).unwrap();
        assert!(get_token_user(&conn, &token).unwrap().is_none());
    }

    #[test]
    fn test_expired_tokens() {
        let conn = setup();
        let user = create_user(&conn, &new_user("amani", "amani@example.com"), "hash").unwrap();
        let expired = create_token(&conn, &user.user_id, -1).unwrap();
        let live = create_token(&conn, &user.user_id, 1).unwrap();

        assert!(get_token_user(&conn, &expired).unwrap().is_none());
        assert_eq!(cleanup_expired_tokens(&conn).unwrap(), 1);
        assert!(get_token_user(&conn, &live).unwrap().is_some());
    }

    #[test]
    fn test_get_all_users() {
        let conn = setup();
        create_user(&conn, &new_user("amani", "amani@example.com"), "hash").unwrap();
        create_user(&conn, &new_user("keza", "keza@example.com"), "hash").unwrap();
        let users = get_all_users(&conn).unwrap();
        assert_eq!(users.len(), 2);
    }
}
