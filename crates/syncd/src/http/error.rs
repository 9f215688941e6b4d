//! Maps the crate-wide `sync_core::Error` onto the structured JSON error
//! body every webhook and handler-introspection route returns, following
//! the `{code, type, detail, url, path, method}` shape the original API
//! responds with on failure.

use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sync_core::Error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub detail: String,
    pub url: String,
    pub path: String,
    pub method: String,
}

/// Thin wrapper so route handlers can return `Result<T, ApiError>` and get
/// a JSON error response for free via `IntoResponse`. Carries the request
/// method and path so the error body can report them; handlers that can't
/// supply that context fall back to empty strings via `From<Error>`.
pub struct ApiError {
    pub error: Error,
    pub method: String,
    pub url: String,
    pub path: String,
}

impl ApiError {
    pub fn new(error: impl Into<Error>, method: &Method, uri: &Uri) -> Self {
        Self {
            error: error.into(),
            method: method.to_string(),
            url: uri.to_string(),
            path: uri.path().to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self {
            error,
            method: String::new(),
            url: String::new(),
            path: String::new(),
        }
    }
}

fn status_and_kind(err: &Error) -> (StatusCode, &'static str) {
    match err {
        Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ConfigurationError"),
        Error::Validation { .. } => (StatusCode::BAD_REQUEST, "ValidationError"),
        Error::Dispatch(_) => (StatusCode::BAD_GATEWAY, "DispatchError"),
        Error::Remote { .. } => (StatusCode::BAD_GATEWAY, "RemoteError"),
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
        Error::Ambiguous(_) => (StatusCode::CONFLICT, "AmbiguousMatch"),
        Error::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = status_and_kind(&self.error);
        tracing::error!(error = %self.error, kind, path = %self.path, "request failed");
        let body = ErrorBody {
            code: status.as_u16(),
            kind,
            detail: self.error.to_string(),
            url: self.url,
            path: self.path,
            method: self.method,
        };
        (status, Json(body)).into_response()
    }
}
