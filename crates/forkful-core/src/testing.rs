//! Shared seed data for service tests.
//!
//! Follow graph: alice -> {bob, carol}, bob -> {alice}, carol -> {alice, bob}.
//! dave follows nobody; ghost is soft-deleted.

use chrono::{DateTime, TimeZone, Utc};

use forkful_db::Database;
use forkful_db::import::{ImportBatch, ImportRecipe, ImportReview, ImportUser};
use forkful_types::models::{AuthInfo, Gender, Nutrition, RecipeId, ReviewId, UserId};

use crate::Forkful;

pub const ALICE: UserId = 1;
pub const BOB: UserId = 2;
pub const CAROL: UserId = 3;
pub const DAVE: UserId = 4;
pub const GHOST: UserId = 5;

/// bob, Soup, 100 kcal, one review by carol.
pub const SOUP: RecipeId = 10;
/// alice, Salad, 105 kcal, no reviews.
pub const SALAD: RecipeId = 11;
/// carol, Soup, 200 kcal, reviews by alice (5) and bob (2).
pub const STEW: RecipeId = 12;
/// bob, Breakfast, calories unknown, no ingredients.
pub const TOAST: RecipeId = 13;

pub const SOUP_REVIEW: ReviewId = 100;
pub const STEW_REVIEW_ALICE: ReviewId = 101;
pub const STEW_REVIEW_BOB: ReviewId = 102;

pub fn as_user(id: UserId) -> Option<AuthInfo> {
    Some(AuthInfo::new(id))
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 3, d, 12, 0, 0).unwrap()
}

fn user(id: UserId, name: &str, following: Vec<UserId>) -> ImportUser {
    ImportUser {
        id,
        name: name.to_string(),
        password: format!("{name}-pw"),
        gender: Gender::Unknown,
        age: 30,
        is_deleted: id == GHOST,
        following,
    }
}

#[allow(clippy::too_many_arguments)]
fn recipe(
    id: RecipeId,
    author_id: UserId,
    name: &str,
    category: &str,
    calories: Option<f64>,
    published: u32,
    rating: (Option<f64>, i64),
    ingredients: &[&str],
) -> ImportRecipe {
    ImportRecipe {
        id,
        author_id,
        name: name.to_string(),
        description: Some(format!("a {name} recipe")),
        category: Some(category.to_string()),
        cook_time: Some("PT30M".to_string()),
        prep_time: Some("PT10M".to_string()),
        date_published: day(published),
        aggregated_rating: rating.0,
        review_count: rating.1,
        nutrition: Nutrition {
            calories,
            ..Nutrition::default()
        },
        servings: Some(2),
        recipe_yield: None,
        ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
    }
}

fn review(id: ReviewId, recipe_id: RecipeId, author_id: UserId, rating: i32) -> ImportReview {
    ImportReview {
        id,
        recipe_id,
        author_id,
        rating,
        content: format!("review {id}"),
        date_submitted: day(5),
        date_modified: day(5),
        likes: Vec::new(),
    }
}

pub fn batch() -> ImportBatch {
    ImportBatch {
        users: vec![
            user(ALICE, "alice", vec![BOB, CAROL]),
            user(BOB, "bob", vec![ALICE]),
            user(CAROL, "carol", vec![ALICE, BOB]),
            user(DAVE, "dave", vec![]),
            user(GHOST, "ghost", vec![]),
        ],
        recipes: vec![
            recipe(SOUP, BOB, "leek soup", "Soup", Some(100.0), 1, (Some(4.0), 1), &[
                "leek", "potato", "leek",
            ]),
            recipe(SALAD, ALICE, "green salad", "Salad", Some(105.0), 2, (None, 0), &[
                "lettuce", "tomato", "cucumber", "oil",
            ]),
            recipe(STEW, CAROL, "beef stew", "Soup", Some(200.0), 3, (Some(3.5), 2), &[
                "beef", "carrot", "onion",
            ]),
            recipe(TOAST, BOB, "toast", "Breakfast", None, 4, (None, 0), &[]),
        ],
        reviews: vec![
            review(SOUP_REVIEW, SOUP, CAROL, 4),
            review(STEW_REVIEW_ALICE, STEW, ALICE, 5),
            review(STEW_REVIEW_BOB, STEW, BOB, 2),
        ],
    }
}

pub fn fixture() -> Forkful {
    fixture_with(&batch())
}

pub fn fixture_with(batch: &ImportBatch) -> Forkful {
    let db = Database::open_in_memory().unwrap();
    db.import(batch).unwrap();
    Forkful::new(db)
}
