/// Server error types
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use iseng_core::IsengError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Core(#[from] IsengError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<iseng_storage::StorageError> for ServerError {
    fn from(err: iseng_storage::StorageError) -> Self {
        ServerError::Core(err.into())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Core(IsengError::Validation(_)) => StatusCode::BAD_REQUEST,
            ServerError::Core(IsengError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServerError::Core(_)
            | ServerError::Internal(_)
            | ServerError::Config(_)
            | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ServerError::NotFound(msg) | ServerError::BadRequest(msg) => msg,
            ServerError::Core(ref e @ (IsengError::Validation(_) | IsengError::NotFound { .. })) => {
                e.to_string()
            }
            ServerError::Core(ref e) => {
                tracing::error!(error = %e, "Request failed");
                "Database error".to_string()
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                "Configuration error".to_string()
            }
            ServerError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            ServerError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                "IO error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iseng_core::WriteFailure;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (IsengError::validation("blank"), StatusCode::BAD_REQUEST),
            (IsengError::not_found("User", "x"), StatusCode::NOT_FOUND),
            (IsengError::connection("down"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                IsengError::write(WriteFailure::NoMatchingRow, "gone"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (IsengError::generation("empty"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ServerError::from(err).status(), expected);
        }
    }

    #[test]
    fn server_failures_hide_details() {
        let response = ServerError::Core(IsengError::commit("disk I/O error")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
