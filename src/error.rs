use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// ErrorKind
///
/// The five outcomes a client can observe. Every `AppError` collapses into exactly one of
/// these, and the kind alone decides the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// AppError
///
/// The single error type returned by handlers, the query layer and the repository.
/// Store failures are carried verbatim so they can be logged where the response is built,
/// but the client only ever sees a generic message for them.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    /// Payload validation failure listing every violated rule.
    #[error("invalid payload: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Unauthorized".to_string())
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("Forbidden".to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_) | AppError::Invalid(_) => ErrorKind::BadRequest,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Store(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }
}

/// ErrorBody
///
/// Wire shape of every error response: `{"error": {"message": ..., "status": ...}}`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub message: ErrorMessage,
    pub status: u16,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                ErrorMessage::One("Internal Server Error".to_string())
            }
            AppError::Invalid(errors) => ErrorMessage::Many(errors),
            AppError::BadRequest(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m) => ErrorMessage::One(m),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                message,
                status: status.as_u16(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// Extractor rejections become ordinary client errors so every 4xx shares one body shape.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
