use std::fmt;

use serde::Serialize;
use thiserror::Error;

use forkful_types::duration::DurationError;
use forkful_types::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Recipe,
    Review,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::User => "user",
            Entity::Recipe => "recipe",
            Entity::Review => "review",
        })
    }
}

/// Machine-readable failure kind, stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    AccountInactive,
    NotFound,
    NotOwner,
    SelfFollowRejected,
    SelfLikeRejected,
    InvalidRating,
    InvalidDuration,
    InvalidPageRequest,
    DuplicateName,
    Validation,
    Storage,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("account {0} is inactive or does not exist")]
    AccountInactive(UserId),

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("user {user} does not own {entity} {id}")]
    NotOwner { user: UserId, entity: Entity, id: i64 },

    #[error("users cannot follow themselves")]
    SelfFollowRejected,

    #[error("users cannot like their own review")]
    SelfLikeRejected,

    #[error("rating {0} is outside 1..=5")]
    InvalidRating(i32),

    #[error("invalid duration: {0}")]
    InvalidDuration(#[from] DurationError),

    #[error("invalid page request (page {page}, size {size})")]
    InvalidPageRequest { page: i64, size: i64 },

    #[error("user name '{0}' is already taken")]
    DuplicateName(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        ServiceError::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unauthenticated => ErrorKind::Unauthenticated,
            ServiceError::AccountInactive(_) => ErrorKind::AccountInactive,
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::NotOwner { .. } => ErrorKind::NotOwner,
            ServiceError::SelfFollowRejected => ErrorKind::SelfFollowRejected,
            ServiceError::SelfLikeRejected => ErrorKind::SelfLikeRejected,
            ServiceError::InvalidRating(_) => ErrorKind::InvalidRating,
            ServiceError::InvalidDuration(_) => ErrorKind::InvalidDuration,
            ServiceError::InvalidPageRequest { .. } => ErrorKind::InvalidPageRequest,
            ServiceError::DuplicateName(_) => ErrorKind::DuplicateName,
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        ServiceError::Storage(e.into())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
