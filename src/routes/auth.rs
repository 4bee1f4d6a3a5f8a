use axum::routing::{get, post};
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/session-data", get(handlers::session_data))
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
}
