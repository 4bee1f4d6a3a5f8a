use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::identity::IdentityError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Body or query string the extractor could not parse.
    #[error("{1}")]
    InvalidRequest(StatusCode, String),

    #[error("Content not approved: {0}")]
    Rejected(String),

    #[error("Identity exchange failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized | AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::BadRequest(msg) | AppError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Rejected(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidRequest(status, msg) => (*status, msg.clone()),
            AppError::Identity(IdentityError::Rejected(status)) => {
                tracing::info!("Identity exchange rejected with status {}", status);
                (StatusCode::UNAUTHORIZED, "Invalid session ID".to_string())
            }
            AppError::Identity(e) => {
                tracing::error!("Identity exchange error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Identity service unavailable".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                internal()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                internal()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal()
            }
            AppError::Token(e) => {
                tracing::error!("Token error: {}", e);
                internal()
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                internal()
            }
        };

        (status, Json(serde_json::json!({ "detail": message }))).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            response_status(AppError::not_found("Post")),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unauthorized_returns_401() {
        assert_eq!(
            response_status(AppError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            response_status(AppError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn conflicts_and_rejections_return_400() {
        assert_eq!(
            response_status(AppError::Conflict("Email already registered".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            response_status(AppError::Rejected("spam".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            response_status(AppError::BadRequest("oops".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn identity_errors_split_by_cause() {
        assert_eq!(
            response_status(AppError::Identity(IdentityError::Rejected(403))),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            response_status(AppError::Identity(IdentityError::Malformed(
                "missing email".into()
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn unparseable_requests_keep_the_extractor_status() {
        assert_eq!(
            response_status(AppError::InvalidRequest(
                StatusCode::UNPROCESSABLE_ENTITY,
                "missing field `title`".into()
            )),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn body_is_json_detail() {
        let response = AppError::not_found("Conversation").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Conversation not found");
    }
}
