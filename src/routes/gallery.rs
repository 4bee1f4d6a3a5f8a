use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::content::posts;
use crate::db::models::Photo;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json, Query};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CommunityQuery {
    pub limit: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/gallery/my-photos", get(my_photos))
        .route("/gallery/community", get(community))
}

async fn my_photos(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Vec<Photo>>> {
    let conn = state.db.get()?;
    Ok(Json(posts::photos_by_author(&conn, &user.id)?))
}

async fn community(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<CommunityQuery>,
) -> AppResult<Json<Vec<Photo>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let conn = state.db.get()?;
    Ok(Json(posts::community_photos(&conn, limit)?))
}
