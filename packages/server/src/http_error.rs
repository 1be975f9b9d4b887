//! HTTP error handling
//!
//! Provides consistent JSON error responses for every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use orgchart_core::services::{ErrorKind, ServiceError};
use serde::{Deserialize, Serialize};

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "RESOURCE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_INPUT" | "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => HttpError::new(err.to_string(), "RESOURCE_NOT_FOUND"),
            ErrorKind::InvalidInput => match &err {
                ServiceError::ValidationFailed(inner) => {
                    HttpError::with_details(err.to_string(), "VALIDATION_ERROR", inner.to_string())
                }
                _ => HttpError::new(err.to_string(), "INVALID_INPUT"),
            },
            ErrorKind::Conflict => HttpError::new(err.to_string(), "CONFLICT"),
            ErrorKind::Internal => {
                // Storage details stay in the log
                tracing::error!("Request failed: {}", err);
                HttpError::new("Internal server error", "INTERNAL_ERROR")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::position_not_found("x"), StatusCode::NOT_FOUND),
            (ServiceError::invalid_parent("x"), StatusCode::BAD_REQUEST),
            (ServiceError::duplicate_user("email"), StatusCode::CONFLICT),
            (ServiceError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(HttpError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let http = HttpError::from(ServiceError::QueryFailed(
            "no such table: positions".to_string(),
        ));
        assert_eq!(http.message, "Internal server error");
        assert!(http.details.is_none());
    }
}
