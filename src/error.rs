use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

/// Every variant reaches the client as `400 Bad Request` with the
/// underlying message as a plain-text body.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The body is not multipart or a field could not be read
    #[error("{0}")]
    MalformedRequest(String),

    #[error("missing file field \"{0}\"")]
    MissingField(&'static str),

    #[error(transparent)]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Encoding(#[from] serde_json::Error),
}

impl From<MultipartRejection> for UploadError {
    fn from(rejection: MultipartRejection) -> Self {
        UploadError::MalformedRequest(rejection.body_text())
    }
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::MalformedRequest(err.body_text())
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        warn!(error = %self, "upload rejected");
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}
