//! Gallery error types and error response formatting.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Gallery error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Archive loading
    IndexUnavailable,
    PartitionUnavailable,
    UpstreamStatus,
    UpstreamUnreachable,
    InvalidJson,

    // Request validation
    InvalidQueryParameterValue,
    InvalidResolution,
    PhotoNotFound,

    // Downloads and images
    DownloadFailed,
    InvalidImage,

    InternalError,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IndexUnavailable => "IndexUnavailable",
            ErrorCode::PartitionUnavailable => "PartitionUnavailable",
            ErrorCode::UpstreamStatus => "UpstreamStatus",
            ErrorCode::UpstreamUnreachable => "UpstreamUnreachable",
            ErrorCode::InvalidJson => "InvalidJson",
            ErrorCode::InvalidQueryParameterValue => "InvalidQueryParameterValue",
            ErrorCode::InvalidResolution => "InvalidResolution",
            ErrorCode::PhotoNotFound => "PhotoNotFound",
            ErrorCode::DownloadFailed => "DownloadFailed",
            ErrorCode::InvalidImage => "InvalidImage",
            ErrorCode::InternalError => "InternalError",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ErrorCode::InvalidQueryParameterValue | ErrorCode::InvalidResolution => {
                StatusCode::BAD_REQUEST
            }

            // 404 Not Found
            ErrorCode::PhotoNotFound | ErrorCode::PartitionUnavailable => StatusCode::NOT_FOUND,

            // 502 Bad Gateway
            ErrorCode::UpstreamStatus
            | ErrorCode::UpstreamUnreachable
            | ErrorCode::InvalidJson
            | ErrorCode::DownloadFailed
            | ErrorCode::InvalidImage => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            ErrorCode::IndexUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::IndexUnavailable => "Unable to load data",
            ErrorCode::PartitionUnavailable => "The requested partition could not be loaded.",
            ErrorCode::UpstreamStatus => "The archive returned an unexpected status.",
            ErrorCode::UpstreamUnreachable => "The archive could not be reached.",
            ErrorCode::InvalidJson => "The archive returned malformed JSON.",
            ErrorCode::InvalidQueryParameterValue => {
                "The value for one of the query parameters is not valid."
            }
            ErrorCode::InvalidResolution => "The requested resolution is not supported.",
            ErrorCode::PhotoNotFound => "No photo exists for the requested date.",
            ErrorCode::DownloadFailed => "The image could not be downloaded.",
            ErrorCode::InvalidImage => "The image could not be decoded.",
            ErrorCode::InternalError => "The server encountered an internal error.",
        }
    }
}

/// Gallery error with code and message.
#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct GalleryError {
    pub code: ErrorCode,
    pub message: String,
    /// HTTP status returned by the archive or image host, when there was one.
    pub upstream_status: Option<u16>,
    pub request_id: Option<String>,
}

impl GalleryError {
    /// Creates a new gallery error with the given code and default message.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.default_message().to_string(),
            code,
            upstream_status: None,
            request_id: None,
        }
    }

    /// Creates a new gallery error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            upstream_status: None,
            request_id: None,
        }
    }

    /// Creates an error for a non-success upstream response.
    pub fn upstream_status(url: &str, status: u16) -> Self {
        Self {
            code: ErrorCode::UpstreamStatus,
            message: format!("{} returned HTTP {}", url, status),
            upstream_status: Some(status),
            request_id: None,
        }
    }

    /// Sets the request ID for this error.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Re-labels the error while keeping the upstream status.
    pub fn recode(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(err: serde_json::Error) -> Self {
        GalleryError::with_message(ErrorCode::InvalidJson, err.to_string())
    }
}

impl From<reqwest::Error> for GalleryError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GalleryError {
                code: ErrorCode::UpstreamStatus,
                message: err.to_string(),
                upstream_status: Some(status.as_u16()),
                request_id: None,
            },
            None => GalleryError::with_message(ErrorCode::UpstreamUnreachable, err.to_string()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    request_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let request_id = self
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            request_id: &request_id,
            upstream_status: self.upstream_status,
        };

        let mut response = (status, Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }
}

/// Result type alias for gallery operations.
pub type GalleryResult<T> = Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_keeps_code_after_recode() {
        let err = GalleryError::upstream_status("https://example.test/a.jpg", 404)
            .recode(ErrorCode::DownloadFailed);
        assert_eq!(err.code, ErrorCode::DownloadFailed);
        assert_eq!(err.upstream_status, Some(404));
        assert_eq!(err.code.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_index_unavailable_is_service_unavailable() {
        let err = GalleryError::new(ErrorCode::IndexUnavailable);
        assert_eq!(err.message, "Unable to load data");
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
