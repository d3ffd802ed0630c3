//! HTTP error responses.
//!
//! Every failure leaves the server as
//! `{"statusCode": 404, "error": "Not Found", "message": "..."}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::error::{LlmError, ServiceError};

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Builds an error with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 with `message`.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 with `message`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// The response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
            ServiceError::BadRequest(message) => Self::bad_request(message),
            ServiceError::Llm(e) => {
                error!(error = %e, "LLM call failed");
                match e {
                    LlmError::Upstream { .. } | LlmError::Parse { .. } => {
                        Self::new(StatusCode::BAD_GATEWAY, e.to_string())
                    }
                    LlmError::Configuration { .. } | LlmError::UnsupportedProvider { .. } => {
                        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                    }
                }
            }
            ServiceError::Storage(e) => {
                error!(error = %e, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "statusCode": self.status.as_u16(),
            "error": self.status.canonical_reason().unwrap_or("Error"),
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use test_case::test_case;

    #[test_case(ServiceError::not_found("Article not found"), StatusCode::NOT_FOUND ; "not found")]
    #[test_case(ServiceError::bad_request("nope"), StatusCode::BAD_REQUEST ; "bad request")]
    #[test_case(LlmError::upstream("timeout").into(), StatusCode::BAD_GATEWAY ; "upstream")]
    #[test_case(LlmError::parse("no json", "hi").into(), StatusCode::BAD_GATEWAY ; "parse")]
    #[test_case(
        LlmError::Configuration { provider: "zhipu" }.into(),
        StatusCode::INTERNAL_SERVER_ERROR ;
        "missing key"
    )]
    #[test_case(StorageError::Lock.into(), StatusCode::INTERNAL_SERVER_ERROR ; "storage")]
    fn test_status_mapping(err: ServiceError, expected: StatusCode) {
        assert_eq!(ApiError::from(err).status(), expected);
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let err = ApiError::from(ServiceError::from(StorageError::Corrupt {
            message: "bad json in row 7".into(),
        }));
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn test_not_found_keeps_message() {
        let err = ApiError::from(ServiceError::not_found("Article not found"));
        assert_eq!(err.message(), "Article not found");
    }
}
