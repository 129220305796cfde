use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use radlink_types::error::CoreError;
use tracing::error;

/// Boundary wrapper mapping the domain taxonomy to HTTP rejections.
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::ForbiddenRole | CoreError::ForbiddenAccess => StatusCode::FORBIDDEN,
            CoreError::EmptyContent | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::LastAdminGuard => StatusCode::CONFLICT,
            CoreError::Storage(e) => {
                error!("storage error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &self.0 {
            CoreError::Storage(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
