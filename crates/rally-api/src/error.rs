//! API error types and JSON error response formatting.
//!
//! Every failing endpoint answers with the same `{error, message}` body so
//! the voice client can treat all failures alike.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::upstream::UpstreamError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "upstream_error").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 502 Bad Gateway - the model could not be reached or answered garbage.
    BadGateway(String),
    /// Upstream model failure, mirrored with the upstream status code.
    Upstream { status: u16, message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::Upstream { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "upstream_error",
                message,
            ),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, message } => ApiError::Upstream { status, message },
            UpstreamError::Transport(msg) | UpstreamError::InvalidResponse(msg) => {
                ApiError::BadGateway(msg)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn into_parts(err: ApiError) -> (StatusCode, ErrorBody) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_status_is_mirrored() {
        let (status, body) = into_parts(ApiError::Upstream {
            status: 503,
            message: "Model is loading".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "upstream_error");
        assert_eq!(body.message, "Model is loading");
    }

    #[tokio::test]
    async fn test_invalid_upstream_status_falls_back_to_bad_gateway() {
        let (status, _) = into_parts(ApiError::Upstream {
            status: 42,
            message: "odd".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let (status, body) = into_parts(ApiError::BadRequest("prompt is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "bad_request");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_from_upstream_error() {
        assert!(matches!(
            ApiError::from(UpstreamError::Transport("refused".into())),
            ApiError::BadGateway(_)
        ));
        assert!(matches!(
            ApiError::from(UpstreamError::InvalidResponse("html".into())),
            ApiError::BadGateway(_)
        ));
        assert!(matches!(
            ApiError::from(UpstreamError::Status {
                status: 401,
                message: "Invalid token".into()
            }),
            ApiError::Upstream { status: 401, .. }
        ));
    }
}
