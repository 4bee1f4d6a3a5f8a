use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use crate::db::models::NotificationPreferences;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json};
use crate::notifications::{self, PreferencesUpdate, TokenRegistration};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications/register-token", post(register_token))
        .route(
            "/notifications/preferences",
            get(get_preferences).put(update_preferences),
        )
}

async fn register_token(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(reg): Json<TokenRegistration>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    notifications::register_token(&conn, &user.id, &reg)?;
    Ok(Json(
        json!({ "message": "Push token registered successfully" }),
    ))
}

async fn get_preferences(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<NotificationPreferences>> {
    let conn = state.db.get()?;
    Ok(Json(notifications::get_preferences(&conn, &user.id)?))
}

async fn update_preferences(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(update): Json<PreferencesUpdate>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    notifications::update_preferences(&conn, &user.id, &update)?;
    Ok(Json(
        json!({ "message": "Preferences updated successfully" }),
    ))
}
