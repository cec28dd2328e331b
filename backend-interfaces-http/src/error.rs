use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use backend_application::AppError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    NotFound,
    NotImplemented(String),
    Internal(String),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::BadRequest(msg) => HttpError::BadRequest(msg),
            AppError::NotSupported(what) => HttpError::NotImplemented(format!("{} is not supported", what)),
            AppError::Internal(err) => HttpError::Internal(format!("{:#}", err)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("bad request: {}", msg)),
            HttpError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            HttpError::NotImplemented(msg) => (StatusCode::NOT_IMPLEMENTED, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
