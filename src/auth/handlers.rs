use axum::extract::State;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::auth::resolver::Credential;
use crate::auth::{password, session};
use crate::content::users::{self, NewUser};
use crate::db::models::{User, UserProfile};
use crate::error::{AppError, AppResult};
use crate::extractors::{authorization, CurrentUser, Json};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDataResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub session_token: String,
}

fn token_response(state: &AppState, user: &User) -> AppResult<Json<TokenResponse>> {
    let access_token = state.tokens.issue(&user.id)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserProfile::from(user),
    }))
}

/// Loose shape check; the address is confirmed by whoever owns the inbox.
fn validate_email(email: &str) -> AppResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid email address".into()))
    }
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<TokenResponse>> {
    let email = req.email.trim().to_string();
    validate_email(&email)?;
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password cannot be empty".into()));
    }
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".into()));
    }

    {
        let conn = state.db.get()?;
        if users::find_by_email(&conn, &email)?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }
    }

    let password_hash = password::hash(req.password, state.config.auth.bcrypt_cost).await?;

    let user = {
        let conn = state.db.get()?;
        users::insert(
            &conn,
            NewUser {
                email,
                name,
                first_name: req.first_name,
                last_name: req.last_name,
                phone_number: req.phone_number,
                address: req.address,
                country: req.country,
                picture: None,
                password_hash: Some(password_hash),
            },
        )?
    };

    tracing::info!("Registered user {}", user.id);
    token_response(&state, &user)
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = {
        let conn = state.db.get()?;
        users::find_by_email(&conn, req.email.trim())?
    };

    let Some(user) = user else {
        return Err(AppError::InvalidCredentials);
    };
    if !password::verify(req.password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    token_response(&state, &user)
}

/// GET /auth/session-data: trade an external `X-Session-ID` for a local session.
pub async fn session_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SessionDataResponse>> {
    let session_id = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("X-Session-ID header required".into()))?;

    let identity = state.identity.exchange(session_id).await?;

    let conn = state.db.get()?;
    let user = users::find_or_create(
        &conn,
        NewUser {
            email: identity.email,
            name: identity.name,
            picture: identity.picture,
            ..NewUser::default()
        },
    )?;
    let session = session::create_session(&conn, &user.id, state.config.auth.session_days)?;

    Ok(Json(SessionDataResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        picture: user.picture,
        session_token: session.session_token,
    }))
}

/// GET /auth/me
pub async fn me(user: CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user.0))
}

/// POST /auth/logout. Bearer tokens simply expire; session tokens are deleted.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<serde_json::Value>> {
    if let Some(Credential::Session(token)) = authorization(&headers).and_then(Credential::parse) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }
    Ok(Json(
        serde_json::json!({ "message": "Logged out successfully" }),
    ))
}
