//! Bulk loading of pre-validated user, recipe and review batches.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use forkful_types::duration::TimeField;
use forkful_types::models::{Gender, Nutrition, RecipeId, ReviewId, UserId};

use crate::Database;
use crate::models::format_timestamp;
use crate::queries::recipes;
use crate::sequence::{self, IdKind};

#[derive(Debug, Clone)]
pub struct ImportUser {
    pub id: UserId,
    pub name: String,
    pub password: String,
    pub gender: Gender,
    pub age: i32,
    pub is_deleted: bool,
    /// Accounts this user follows.
    pub following: Vec<UserId>,
}

#[derive(Debug, Clone)]
pub struct ImportRecipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Raw ISO-8601 text; unparseable values are kept and count as zero seconds.
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
    pub date_published: DateTime<Utc>,
    pub aggregated_rating: Option<f64>,
    pub review_count: i64,
    pub nutrition: Nutrition,
    pub servings: Option<i32>,
    pub recipe_yield: Option<String>,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImportReview {
    pub id: ReviewId,
    pub recipe_id: RecipeId,
    pub author_id: UserId,
    pub rating: i32,
    pub content: String,
    pub date_submitted: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    pub likes: Vec<UserId>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub users: Vec<ImportUser>,
    pub recipes: Vec<ImportRecipe>,
    pub reviews: Vec<ImportReview>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub users: usize,
    pub follows: usize,
    pub recipes: usize,
    pub ingredients: usize,
    pub reviews: usize,
    pub likes: usize,
}

impl Database {
    /// Load a batch in one transaction. Duplicate follows and likes are skipped,
    /// as are self-follows and self-likes. Aggregate fields are taken as supplied.
    pub fn import(&self, batch: &ImportBatch) -> Result<ImportSummary> {
        let summary = self.transaction(|tx| import_batch(tx, batch))?;
        info!(
            "Imported {} users ({} follows), {} recipes ({} ingredients), {} reviews ({} likes)",
            summary.users,
            summary.follows,
            summary.recipes,
            summary.ingredients,
            summary.reviews,
            summary.likes
        );
        Ok(summary)
    }
}

fn import_batch(conn: &Connection, batch: &ImportBatch) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    {
        let mut stmt = conn.prepare(
            "INSERT INTO users (id, name, password, gender, age, is_deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for user in &batch.users {
            stmt.execute(rusqlite::params![
                user.id,
                user.name,
                user.password,
                user.gender.as_str(),
                user.age,
                user.is_deleted
            ])?;
            summary.users += 1;
        }
    }

    {
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO user_follows (follower_id, followee_id) VALUES (?1, ?2)",
        )?;
        for user in &batch.users {
            for &followee in user.following.iter().filter(|&&f| f != user.id) {
                summary.follows += stmt.execute([user.id, followee])?;
            }
        }
    }

    {
        let mut stmt = conn.prepare(
            "INSERT INTO recipes (id, author_id, name, description, category,
                 cook_time_iso, cook_time_sec, prep_time_iso, prep_time_sec, date_published,
                 aggregated_rating, review_count,
                 calories, fat, saturated_fat, cholesterol, sodium, carbohydrate, fiber, sugar,
                 protein, servings, yield)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
        )?;
        for recipe in &batch.recipes {
            let cook = TimeField::from_text(recipe.cook_time.as_deref());
            let prep = TimeField::from_text(recipe.prep_time.as_deref());
            let n = &recipe.nutrition;
            stmt.execute(rusqlite::params![
                recipe.id,
                recipe.author_id,
                recipe.name,
                recipe.description,
                recipe.category,
                cook.text(),
                cook.seconds(),
                prep.text(),
                prep.seconds(),
                format_timestamp(&recipe.date_published),
                recipe.aggregated_rating,
                recipe.review_count,
                n.calories,
                n.fat,
                n.saturated_fat,
                n.cholesterol,
                n.sodium,
                n.carbohydrate,
                n.fiber,
                n.sugar,
                n.protein,
                recipe.servings,
                recipe.recipe_yield,
            ])?;
            recipes::insert_ingredients(conn, recipe.id, &recipe.ingredients)?;
            summary.recipes += 1;
            summary.ingredients += recipe.ingredients.len();
        }
    }

    {
        let mut review_stmt = conn.prepare(
            "INSERT INTO reviews (id, recipe_id, author_id, rating, content, date_submitted, date_modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        let mut like_stmt = conn.prepare(
            "INSERT OR IGNORE INTO review_likes (review_id, user_id) VALUES (?1, ?2)",
        )?;
        for review in &batch.reviews {
            review_stmt.execute(rusqlite::params![
                review.id,
                review.recipe_id,
                review.author_id,
                review.rating,
                review.content,
                format_timestamp(&review.date_submitted),
                format_timestamp(&review.date_modified),
            ])?;
            summary.reviews += 1;
            for &user in review.likes.iter().filter(|&&u| u != review.author_id) {
                summary.likes += like_stmt.execute([review.id, user])?;
            }
        }
    }

    for kind in [IdKind::User, IdKind::Recipe, IdKind::Review] {
        sequence::advance_past_existing(conn, kind)?;
    }

    Ok(summary)
}
