use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::db::models::{Conversation, Message};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, Json, Query};
use crate::messaging::{self, NewMessage};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send))
        .route("/conversations", get(list_conversations))
        .route("/conversations/{id}/messages", get(list_messages))
}

async fn send(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewMessage>,
) -> AppResult<Json<Message>> {
    let mut conn = state.db.get()?;
    Ok(Json(messaging::send_message(&mut conn, &user, new)?))
}

async fn list_conversations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Conversation>>> {
    let conn = state.db.get()?;
    Ok(Json(messaging::list_conversations(&conn, &user.id)?))
}

async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> AppResult<Json<Vec<Message>>> {
    let limit = messaging::clamp_limit(query.limit);
    let mut conn = state.db.get()?;
    Ok(Json(messaging::get_messages(&mut conn, &id, &user.id, limit)?))
}
