use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gallery_shared::error::{PageError, ThumbnailError};
use gallery_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Image not found: {0}")]
    ImageNotFound(i64),

    #[error("Asset storage error: {0}")]
    AssetStorage(String),

    #[error("Thumbnail generation failed: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Too many login attempts, try again later")]
    TooManyRequests,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl From<PageError> for ServerError {
    fn from(e: PageError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::ImageNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::AssetStorage(_) | ServerError::Thumbnail(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Asset storage error".to_string())
            }
            ServerError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ServerError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ServerError::InvalidCredentials | ServerError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ServerError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
