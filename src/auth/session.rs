use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{format_time, time_column};
use crate::db::models::Session;
use crate::state::DbPool;

/// Create a new session for a user. Returns the stored session.
pub fn create_session(
    conn: &Connection,
    user_id: &str,
    days: i64,
) -> Result<Session, rusqlite::Error> {
    let now = Utc::now();
    let session = Session {
        session_token: generate_token(),
        user_id: user_id.to_string(),
        expires_at: now + Duration::days(days),
        created_at: now,
    };

    conn.execute(
        "INSERT INTO sessions (session_token, user_id, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            session.session_token,
            session.user_id,
            format_time(&session.expires_at),
            format_time(&session.created_at)
        ],
    )?;

    Ok(session)
}

/// Exact-match lookup. Expiry is the caller's concern.
pub fn find_session(conn: &Connection, token: &str) -> Result<Option<Session>, rusqlite::Error> {
    conn.query_row(
        "SELECT session_token, user_id, expires_at, created_at FROM sessions WHERE session_token = ?1",
        params![token],
        |row| {
            Ok(Session {
                session_token: row.get(0)?,
                user_id: row.get(1)?,
                expires_at: time_column(row, 2)?,
                created_at: time_column(row, 3)?,
            })
        },
    )
    .optional()
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> Result<(), rusqlite::Error> {
    conn.execute("DELETE FROM sessions WHERE session_token = ?1", params![token])?;
    Ok(())
}

/// Remove sessions that expired before `now`. Returns the number deleted.
pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![format_time(&now)],
    )
}

/// Periodically purge expired sessions. Reads never depend on this.
pub async fn run_reaper(pool: DbPool, every: std::time::Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let result = pool
            .get()
            .map_err(|e| e.to_string())
            .and_then(|conn| purge_expired(&conn, Utc::now()).map_err(|e| e.to_string()));
        match result {
            Ok(0) => {}
            Ok(n) => tracing::info!("Purged {} expired sessions", n),
            Err(e) => tracing::warn!("Session reaper failed: {}", e),
        }
    }
}

/// `session_` followed by 32 random bytes in hex.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    format!("session_{}", hex::encode(bytes))
}
