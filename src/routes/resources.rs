use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::content::resources;
use crate::db::models::{PostCategory, Resource};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json, Query};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ResourceQuery {
    pub category: Option<PostCategory>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/resources", get(list))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ResourceQuery>,
) -> AppResult<Json<Vec<Resource>>> {
    let conn = state.db.get()?;
    Ok(Json(resources::list(&conn, query.category, user.is_premium)?))
}
