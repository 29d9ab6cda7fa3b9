//! Gateway error handling with JSON `{error}` responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use dearly_protocol::ErrorBody;

/// Errors surfaced to gateway callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration or internal failure; always a 500.
    #[error("{0}")]
    Internal(String),

    /// Upstream model failure whose status is relayed as-is. Used for the
    /// rate-limit (429) and payment-required (402) statuses the client
    /// recognizes; everything else collapses to [`ApiError::Internal`].
    #[error("AI service error")]
    Upstream(StatusCode),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Map an upstream response status onto a gateway error.
    pub fn from_upstream_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => Self::Upstream(status),
            _ => Self::Internal("AI service error".to_string()),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(status) => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        error!(%status, %message, "gateway error");

        let body = ErrorBody { error: message };
        (status, Json(body)).into_response()
    }
}

/// Result type for gateway handlers.
pub type ApiResult<T> = Result<T, ApiError>;
