use chrono::Utc;
use rusqlite::Connection;

use crate::auth::session;
use crate::auth::tokens::TokenIssuer;
use crate::content::users;
use crate::db::models::User;
use crate::error::{AppError, AppResult};

/// What the `Authorization` header carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    Bearer(&'a str),
    Session(&'a str),
}

impl<'a> Credential<'a> {
    /// `Bearer <jwt>` is a signed token; anything else is an opaque session token.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix("Bearer ") {
            Some(token) => Some(Credential::Bearer(token.trim())),
            None => Some(Credential::Session(raw)),
        }
    }
}

/// Resolve a credential to its user. Bad, expired or unknown credentials
/// give `None`; only store failures are errors.
pub fn resolve(
    conn: &Connection,
    tokens: &TokenIssuer,
    raw: Option<&str>,
) -> AppResult<Option<User>> {
    let Some(credential) = raw.and_then(Credential::parse) else {
        return Ok(None);
    };

    match credential {
        Credential::Bearer(token) => match tokens.verify(token) {
            Ok(claims) => users::find_by_id(conn, &claims.sub),
            Err(e) => {
                tracing::debug!("Bearer token rejected: {}", e);
                Ok(None)
            }
        },
        Credential::Session(token) => {
            let Some(session) = session::find_session(conn, token)? else {
                return Ok(None);
            };
            if !session.is_valid_at(Utc::now()) {
                return Ok(None);
            }
            users::find_by_id(conn, &session.user_id)
        }
    }
}

pub fn require(conn: &Connection, tokens: &TokenIssuer, raw: Option<&str>) -> AppResult<User> {
    resolve(conn, tokens, raw)?.ok_or(AppError::Unauthorized)
}
