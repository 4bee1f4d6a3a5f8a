use std::ops::Deref;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{header, HeaderMap};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::resolver;
use crate::db::models::User;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller.
/// Returns 401 if the `Authorization` header resolves to nobody.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let conn = state.db.get()?;
        let user = resolver::require(&conn, &state.tokens, authorization(&parts.headers))?;
        Ok(CurrentUser(user))
    }
}

/// Raw `Authorization` header value, if any.
pub fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// `axum::Json`, but a body that fails to parse answers with a `{"detail"}` error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// `axum::extract::Query` with the same error shape as [`Json`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);
