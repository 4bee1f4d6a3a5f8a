use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::content::comments::{self, NewComment};
use crate::content::posts::{self, LikeToggle, NewPost};
use crate::db::models::{Comment, Post, PostCategory};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, Json, Query};
use crate::notifications;
use crate::state::AppState;

// --- Queries ---

#[derive(Deserialize)]
pub struct FeedQuery {
    pub category: Option<PostCategory>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}/like", post(toggle_like))
        .route("/posts/{id}/comments", get(list_comments))
        .route("/comments", post(create_comment))
}

// --- Handlers ---

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewPost>,
) -> AppResult<Json<Post>> {
    new.validate()?;

    let verdict = state.moderator.moderate(&new.moderation_text()).await;
    if !verdict.approved {
        tracing::info!("Post by {} rejected by moderation", user.id);
        return Err(AppError::Rejected(verdict.reason().to_string()));
    }

    let post = {
        let conn = state.db.get()?;
        posts::insert_approved(&conn, &user, new)?
    };

    let db = state.db.clone();
    let push = state.push.clone();
    let announced = post.clone();
    tokio::spawn(async move {
        notifications::notify_new_post(&db, push.as_ref(), &announced).await;
    });

    Ok(Json(post))
}

async fn list_posts(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let skip = query.skip.unwrap_or(0).max(0);
    let conn = state.db.get()?;
    Ok(Json(posts::list(&conn, query.category, limit, skip)?))
}

async fn get_post(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Post>> {
    let conn = state.db.get()?;
    Ok(Json(posts::get(&conn, &id)?))
}

async fn toggle_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<LikeToggle>> {
    let mut conn = state.db.get()?;
    Ok(Json(posts::toggle_like(&mut conn, &id, &user.id)?))
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewComment>,
) -> AppResult<Json<Comment>> {
    new.validate()?;
    {
        let conn = state.db.get()?;
        comments::ensure_post_exists(&conn, &new.post_id)?;
    }

    let verdict = state.moderator.moderate(&new.content).await;
    if !verdict.approved {
        return Err(AppError::Rejected(verdict.reason().to_string()));
    }

    let mut conn = state.db.get()?;
    Ok(Json(comments::insert(&mut conn, &user, new)?))
}

async fn list_comments(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    let conn = state.db.get()?;
    Ok(Json(comments::list_for_post(&conn, &id)?))
}
