use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::Router;
use serde::Deserialize;

use crate::content::milestones::{self, NewMilestone};
use crate::db::models::Milestone;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json, Query};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CompleteQuery {
    pub notes: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/milestones", get(list).post(create))
        .route("/milestones/{id}/complete", put(complete))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewMilestone>,
) -> AppResult<Json<Milestone>> {
    let conn = state.db.get()?;
    Ok(Json(milestones::create(&conn, &user.id, new)?))
}

async fn list(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Vec<Milestone>>> {
    let conn = state.db.get()?;
    Ok(Json(milestones::list_for_user(&conn, &user.id)?))
}

async fn complete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<CompleteQuery>,
) -> AppResult<Json<Milestone>> {
    let conn = state.db.get()?;
    Ok(Json(milestones::complete(&conn, &id, &user.id, query.notes)?))
}
