use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure of a request handler.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is malformed. The message is returned to the client.
    BadRequest(&'static str),
    /// The core could not complete the operation. Details stay server-side.
    Core(latchkey::Error),
}

impl From<latchkey::Error> for ApiError {
    fn from(err: latchkey::Error) -> Self {
        Self::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Self::Core(err) => {
                tracing::error!(retryable = err.is_retryable(), "request failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
