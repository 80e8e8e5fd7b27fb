use crate::core::errors::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Read endpoints answer a missing path with 400 rather than 404.
    pub fn missing_as_bad_request(err: Error) -> Self {
        match err {
            Error::NotFound(_) => ApiError::BadRequest(err.to_string()),
            other => other.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Confinement | Error::InvalidArgument(_) => ApiError::BadRequest(err.to_string()),
            Error::NotFound(_) => ApiError::NotFound(err.to_string()),
            Error::Io(_) | Error::Other(_) => {
                tracing::error!("request failed: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => msg,
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
