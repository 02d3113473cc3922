//! The single writer of a recipe's rating and review count.

use anyhow::Result;
use rusqlite::Connection;
use tracing::debug;

use forkful_db::queries::{recipes, reviews};
use forkful_types::models::RecipeId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Mean rating to 2 decimals; `None` without reviews.
    pub rating: Option<f64>,
    pub review_count: i64,
}

pub fn summarize(ratings: &[i32]) -> Aggregate {
    let review_count = ratings.len() as i64;
    let rating = (review_count > 0).then(|| {
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        mean_hundredths(sum, review_count) as f64 / 100.0
    });
    Aggregate {
        rating,
        review_count,
    }
}

/// `sum / count` in hundredths, halves rounded up, computed exactly on integers.
fn mean_hundredths(sum: i64, count: i64) -> i64 {
    (200 * sum + count).div_euclid(2 * count)
}

/// Recompute from the current review set. Call on the connection of the transaction
/// that mutated the reviews so the recipe never commits with a stale aggregate.
pub fn recompute(conn: &Connection, recipe: RecipeId) -> Result<Aggregate> {
    let aggregate = summarize(&reviews::ratings_for_recipe(conn, recipe)?);
    recipes::set_aggregate(conn, recipe, aggregate.rating, aggregate.review_count)?;
    debug!(
        "Recipe {} aggregate: {:?} over {} reviews",
        recipe, aggregate.rating, aggregate.review_count
    );
    Ok(aggregate)
}
