use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use forkful_types::models::{RecipeId, ReviewId, UserId};

use super::OptionalExt;
use crate::models::{NewReview, ReviewHeader, ReviewRow, format_timestamp};

pub fn header(conn: &Connection, id: ReviewId) -> Result<Option<ReviewHeader>> {
    conn.query_row(
        "SELECT id, recipe_id, author_id FROM reviews WHERE id = ?1",
        [id],
        |row| {
            Ok(ReviewHeader {
                id: row.get(0)?,
                recipe_id: row.get(1)?,
                author_id: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn insert(conn: &Connection, review: &NewReview<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO reviews (id, recipe_id, author_id, rating, content, date_submitted, date_modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            review.id,
            review.recipe_id,
            review.author_id,
            review.rating,
            review.content,
            format_timestamp(&review.date_submitted),
            format_timestamp(&review.date_modified),
        ],
    )?;
    Ok(())
}

pub fn update(
    conn: &Connection,
    id: ReviewId,
    rating: i32,
    content: &str,
    modified: DateTime<Utc>,
) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE reviews SET rating = ?2, content = ?3, date_modified = ?4 WHERE id = ?1",
        rusqlite::params![id, rating, content, format_timestamp(&modified)],
    )?;
    Ok(changed)
}

/// Hard-delete a review together with its likes.
pub fn delete(conn: &Connection, id: ReviewId) -> Result<usize> {
    conn.execute("DELETE FROM review_likes WHERE review_id = ?1", [id])?;
    let removed = conn.execute("DELETE FROM reviews WHERE id = ?1", [id])?;
    Ok(removed)
}

pub fn ratings_for_recipe(conn: &Connection, recipe: RecipeId) -> Result<Vec<i32>> {
    let mut stmt = conn.prepare("SELECT rating FROM reviews WHERE recipe_id = ?1")?;
    let ratings = stmt
        .query_map([recipe], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ratings)
}

pub fn count_for_recipe(conn: &Connection, recipe: RecipeId) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reviews WHERE recipe_id = ?1",
        [recipe],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// One window of a recipe's reviews. `order_by` must be a trusted, fully-determined clause.
pub fn page_for_recipe(
    conn: &Connection,
    recipe: RecipeId,
    order_by: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<ReviewRow>> {
    let sql = format!(
        "SELECT r.id, r.recipe_id, r.author_id, u.name, r.rating, r.content,
                r.date_submitted, r.date_modified
         FROM reviews r LEFT JOIN users u ON u.id = r.author_id
         WHERE r.recipe_id = ?1
         ORDER BY {order_by}
         LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params![recipe, limit as i64, offset as i64],
            |row| {
                Ok(ReviewRow {
                    id: row.get(0)?,
                    recipe_id: row.get(1)?,
                    author_id: row.get(2)?,
                    author_name: row.get(3)?,
                    rating: row.get(4)?,
                    content: row.get(5)?,
                    date_submitted: row.get(6)?,
                    date_modified: row.get(7)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Likes --

/// Liking user ids, ascending.
pub fn likes(conn: &Connection, review: ReviewId) -> Result<Vec<UserId>> {
    let mut stmt = conn
        .prepare("SELECT user_id FROM review_likes WHERE review_id = ?1 ORDER BY user_id ASC")?;
    let ids = stmt
        .query_map([review], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn like_count(conn: &Connection, review: ReviewId) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM review_likes WHERE review_id = ?1",
        [review],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// No-op when the like already exists.
pub fn insert_like(conn: &Connection, review: ReviewId, user: UserId) -> Result<usize> {
    let added = conn.execute(
        "INSERT OR IGNORE INTO review_likes (review_id, user_id) VALUES (?1, ?2)",
        [review, user],
    )?;
    Ok(added)
}

/// No-op when the like is absent.
pub fn delete_like(conn: &Connection, review: ReviewId, user: UserId) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM review_likes WHERE review_id = ?1 AND user_id = ?2",
        [review, user],
    )?;
    Ok(removed)
}
