use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use forkful_core::{ErrorKind, ServiceError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("invalid user id or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::AccountInactive | ErrorKind::NotOwner => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::SelfFollowRejected
        | ErrorKind::SelfLikeRejected
        | ErrorKind::InvalidRating
        | ErrorKind::InvalidDuration
        | ErrorKind::InvalidPageRequest
        | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::DuplicateName => StatusCode::CONFLICT,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Service(e) => e.kind(),
            ApiError::InvalidCredentials | ApiError::InvalidToken => ErrorKind::Unauthenticated,
            ApiError::BadRequest(_) => ErrorKind::Validation,
            ApiError::Internal => ErrorKind::Storage,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = match &self {
            ApiError::Service(ServiceError::Storage(e)) => {
                error!("Storage failure: {:#}", e);
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status_for(kind), Json(ErrorBody { kind, message })).into_response()
    }
}
