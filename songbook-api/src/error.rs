//! HTTP error rendering
//!
//! Every failure leaves a handler as an [`ApiError`]: the domain error plus
//! the id of the request that produced it. The body is always
//! `{"requestId": "...", "error": "..."}`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use songbook_common::Error;
use tracing::{error, warn};

/// Domain error tagged with its request id
#[derive(Debug)]
pub struct ApiError {
    pub request_id: String,
    pub error: Error,
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(request_id: impl Into<String>, error: Error) -> Self {
        Self {
            request_id: request_id.into(),
            error,
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.error)
    }
}

/// HTTP status for a domain error
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        Error::ConstraintViolation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.error.to_string();

        if status.is_server_error() {
            error!(request_id = %self.request_id, error = %message, "Request failed");
        } else {
            warn!(request_id = %self.request_id, status = status.as_u16(), error = %message, "Request rejected");
        }

        let body = Json(json!({
            "requestId": self.request_id,
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Attach a request id to a domain result
pub trait WithRequestId<T> {
    fn with_request_id(self, request_id: &str) -> ApiResult<T>;
}

impl<T> WithRequestId<T> for songbook_common::Result<T> {
    fn with_request_id(self, request_id: &str) -> ApiResult<T> {
        self.map_err(|e| ApiError::new(request_id, e))
    }
}

impl<T> WithRequestId<T> for Result<T, JsonRejection> {
    fn with_request_id(self, request_id: &str) -> ApiResult<T> {
        self.map_err(|rejection| {
            ApiError::new(
                request_id,
                Error::InvalidInput(format!("invalid JSON body: {}", rejection.body_text())),
            )
        })
    }
}

impl<T> WithRequestId<T> for Result<T, QueryRejection> {
    fn with_request_id(self, request_id: &str) -> ApiResult<T> {
        self.map_err(|rejection| {
            ApiError::new(
                request_id,
                Error::InvalidInput(format!("invalid query string: {}", rejection.body_text())),
            )
        })
    }
}
