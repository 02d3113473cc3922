//! Checks that gate every mutation. They run inside the caller's transaction, in the
//! order active user, existence, ownership, so the first failing check decides the error.

use rusqlite::Connection;

use forkful_db::models::ReviewHeader;
use forkful_db::queries::{recipes, reviews, users};
use forkful_types::models::{AuthInfo, RecipeId, ReviewId, UserId};

use crate::error::{Entity, Result, ServiceError};

/// The caller must be authenticated and refer to an existing, non-deleted account.
pub fn require_active_user(conn: &Connection, auth: Option<AuthInfo>) -> Result<UserId> {
    let auth = auth.ok_or(ServiceError::Unauthenticated)?;
    match users::deleted_flag(conn, auth.user_id)? {
        Some(false) => Ok(auth.user_id),
        _ => Err(ServiceError::AccountInactive(auth.user_id)),
    }
}

pub fn require_exists<T>(found: Option<T>, entity: Entity, id: i64) -> Result<T> {
    found.ok_or_else(|| ServiceError::not_found(entity, id))
}

pub fn require_ownership(caller: UserId, owner: UserId, entity: Entity, id: i64) -> Result<()> {
    if caller == owner {
        Ok(())
    } else {
        Err(ServiceError::NotOwner {
            user: caller,
            entity,
            id,
        })
    }
}

/// An active user other than through authentication, e.g. a follow target.
pub fn require_user(conn: &Connection, id: UserId) -> Result<()> {
    let active = users::deleted_flag(conn, id)?.filter(|deleted| !deleted);
    require_exists(active, Entity::User, id).map(|_| ())
}

/// A non-deleted recipe; yields its author.
pub fn require_recipe(conn: &Connection, id: RecipeId) -> Result<UserId> {
    require_exists(recipes::author_of(conn, id)?, Entity::Recipe, id)
}

/// A review that exists, optionally under a specific recipe.
pub fn require_review(
    conn: &Connection,
    id: ReviewId,
    recipe: Option<RecipeId>,
) -> Result<ReviewHeader> {
    let header = reviews::header(conn, id)?
        .filter(|h| recipe.is_none_or(|recipe| h.recipe_id == recipe));
    require_exists(header, Entity::Review, id)
}
