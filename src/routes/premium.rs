use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use crate::content::users;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/premium/subscribe", post(subscribe))
        .route("/premium/status", get(status))
}

/// No payment provider; subscribing just flips the flag.
async fn subscribe(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    users::set_premium(&conn, &user.id, true)?;
    tracing::info!("User {} upgraded to premium", user.id);
    Ok(Json(json!({
        "message": "Premium subscription activated",
        "is_premium": true
    })))
}

async fn status(user: CurrentUser) -> Json<Value> {
    Json(json!({ "is_premium": user.is_premium }))
}
