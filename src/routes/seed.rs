use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::extractors::Json;
use crate::seed;
use crate::state::AppState;

/// Only mounted when `server.enable_seed` is set.
pub fn router() -> Router<AppState> {
    Router::new().route("/seed-data", post(seed_data))
}

async fn seed_data(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let mut conn = state.db.get()?;
    let report = seed::load(&mut conn)?;
    Ok(Json(json!({
        "message": "Data seeded successfully",
        "inserted": report
    })))
}
