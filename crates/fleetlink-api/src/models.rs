//! Response models for the JSON API.
//!
//! The device polling channel answers in plain text / form-urlencoded
//! (the firmware parses raw bodies); everything else speaks JSON.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Result type for JSON handlers.
pub type HandlerResult<T> = Result<Json<T>, ErrorResponse>;

/// Success helper for handlers returning ad-hoc JSON.
pub fn ok(value: serde_json::Value) -> HandlerResult<serde_json::Value> {
    Ok(Json(value))
}

/// Error returned by the JSON API, mapped to an HTTP status.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: "FORBIDDEN",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": {
                    "code": self.code,
                    "message": self.message,
                }
            })),
        )
            .into_response()
    }
}

impl From<fleetlink_storage::Error> for ErrorResponse {
    fn from(err: fleetlink_storage::Error) -> Self {
        match err {
            fleetlink_storage::Error::NotFound(message) => Self::not_found(message),
            other => {
                tracing::error!(error = %other, "storage failure");
                Self::internal(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorResponse::bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(ErrorResponse::not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(ErrorResponse::forbidden("x").status, StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorResponse::internal("x").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: ErrorResponse =
            fleetlink_storage::Error::NotFound("machine".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ErrorResponse =
            fleetlink_storage::Error::Storage("redb".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
