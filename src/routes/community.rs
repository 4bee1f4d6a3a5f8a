use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

use crate::content::forums;
use crate::db::models::{Forum, SupportGroup};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forums", get(list_forums))
        .route("/forums/{id}", get(get_forum))
        .route("/support-groups", get(list_groups))
        .route("/support-groups/{id}/join", post(join_group))
}

async fn list_forums(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<Forum>>> {
    let conn = state.db.get()?;
    Ok(Json(forums::list_forums(&conn)?))
}

async fn get_forum(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Forum>> {
    let conn = state.db.get()?;
    Ok(Json(forums::get_forum(&conn, &id)?))
}

async fn list_groups(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<SupportGroup>>> {
    let conn = state.db.get()?;
    Ok(Json(forums::list_groups(&conn)?))
}

async fn join_group(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    forums::join_group(&conn, &id, &user.id)?;
    Ok(Json(
        serde_json::json!({ "message": "Joined group successfully" }),
    ))
}
