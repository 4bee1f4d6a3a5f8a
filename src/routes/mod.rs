pub mod auth;
pub mod community;
pub mod gallery;
pub mod messages;
pub mod milestones;
pub mod notifications;
pub mod posts;
pub mod premium;
pub mod resources;
pub mod seed;
pub mod users;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router, everything under `/api`.
pub fn app(state: AppState) -> Router {
    let mut api = Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(posts::router())
        .merge(community::router())
        .merge(milestones::router())
        .merge(resources::router())
        .merge(premium::router())
        .merge(notifications::router())
        .merge(messages::router())
        .merge(gallery::router());

    if state.config.server.enable_seed {
        tracing::warn!("Seed endpoint enabled at /api/seed-data");
        api = api.merge(seed::router());
    }

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
