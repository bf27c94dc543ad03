use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use validator::ValidationErrors;

use crate::data::models::StudyError;

impl IntoResponse for StudyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            StudyError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            StudyError::Validation(e) => (StatusCode::BAD_REQUEST, e),
            StudyError::CardNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            StudyError::StoreUnavailable(e) => {
                log::error!("Store unavailable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Store unavailable".to_string(),
                )
            }
            StudyError::DatabaseError(e) => {
                log::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
        };

        let body = json!({
            "error": message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationErrors> for StudyError {
    fn from(err: ValidationErrors) -> Self {
        StudyError::Validation(err.to_string())
    }
}
