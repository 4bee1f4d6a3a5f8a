use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::content::users::{self, ProfileUpdate, SearchFilter};
use crate::db::models::{PregnancyStage, UserProfile};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json, Query};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub interests: Option<String>,
    pub pregnancy_stage: Option<PregnancyStage>,
    pub limit: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me).put(update_me))
        .route("/users/search", get(search))
}

async fn me(user: CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user.0))
}

async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    let conn = state.db.get()?;
    let updated = users::update_profile(&conn, &user.id, &update)?;
    Ok(Json(UserProfile::from(&updated)))
}

async fn search(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<UserProfile>>> {
    let filter = SearchFilter {
        name: Some(query.q).filter(|q| !q.trim().is_empty()),
        interest: query.interests.filter(|i| !i.is_empty()),
        pregnancy_stage: query.pregnancy_stage,
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };
    let conn = state.db.get()?;
    let found = users::search(&conn, &user.id, &filter)?;
    Ok(Json(found.iter().map(UserProfile::from).collect()))
}
