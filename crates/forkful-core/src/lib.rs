//! Recipe platform services over a [`Database`].
//!
//! Every mutation runs in one IMMEDIATE transaction: guard checks, the write and any
//! aggregate recompute commit together or not at all. Listings and analytics read
//! from the reader pool without locking.

pub mod aggregate;
pub mod analytics;
pub mod error;
pub mod guard;
pub mod pagination;
pub mod recipes;
pub mod reviews;
pub mod social;
pub mod users;

#[cfg(test)]
mod testing;

use forkful_db::Database;

pub use error::{ErrorKind, Result, ServiceError};
pub use pagination::{RecipeSort, ReviewSort};
pub use recipes::SearchParams;

pub struct Forkful {
    db: Database,
}

impl Forkful {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}
