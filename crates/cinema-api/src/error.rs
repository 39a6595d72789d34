use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cinema_schema::FieldErrors;
use cinema_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn movie_not_found() -> Self {
        ApiError::NotFound("Movie not found".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": errors }),
            ),
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "message": message }))
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": message }))
            }
            ApiError::Internal(message) => {
                tracing::error!("{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": message }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
