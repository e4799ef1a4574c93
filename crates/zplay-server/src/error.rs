use std::io;
use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use zplay_session::{AdapterError, SessionError};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Anything a handler can fail with. Every variant renders as
/// `{"error": message}` with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body was unusable.
    #[error("{0}")]
    BadRequest(String),

    /// The registry refused the operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The games directory could not be listed.
    #[error("cannot list games in {}: {source}", dir.display())]
    Catalog {
        /// Configured games directory.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(err) => match err {
                SessionError::Load(_) | SessionError::MultiLineCommand => StatusCode::BAD_REQUEST,
                SessionError::NotFound(_) => StatusCode::NOT_FOUND,
                SessionError::Busy(_) | SessionError::Adapter(AdapterError::Halted) => {
                    StatusCode::CONFLICT
                }
                SessionError::CapacityExceeded(_) => StatusCode::SERVICE_UNAVAILABLE,
                SessionError::Adapter(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
