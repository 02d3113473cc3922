//! Database row types. These map directly to SQLite rows and convert into the
//! forkful-types views at the edge of the store.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use forkful_types::duration::{self, TimeField};
use forkful_types::models::{
    FeedItem, Gender, Nutrition, Recipe, RecipeId, Review, ReviewId, User, UserId,
};

/// Fixed-width UTC text so that lexical order equals time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; treat it as UTC
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub struct UserRow {
    pub id: UserId,
    pub name: String,
    pub password: String,
    pub gender: String,
    pub age: i32,
    pub role: String,
    pub is_deleted: bool,
}

impl UserRow {
    pub fn into_user(self, follower_count: i64, following_count: i64) -> User {
        let gender = self.gender.parse().unwrap_or_else(|e| {
            warn!("User {} has {}", self.id, e);
            Gender::Unknown
        });
        User {
            id: self.id,
            name: self.name,
            gender,
            age: self.age,
            role: self.role,
            is_deleted: self.is_deleted,
            follower_count,
            following_count,
        }
    }
}

pub struct NewUser<'a> {
    pub id: UserId,
    pub name: &'a str,
    pub password: &'a str,
    pub gender: Gender,
    pub age: i32,
}

pub struct RecipeRow {
    pub id: RecipeId,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
    pub date_published: String,
    pub aggregated_rating: Option<f64>,
    pub review_count: i64,
    pub nutrition: Nutrition,
    pub servings: Option<i32>,
    pub recipe_yield: Option<String>,
}

impl RecipeRow {
    pub fn into_recipe(self, ingredients: Vec<String>) -> Recipe {
        let cook_time = TimeField::from_text(self.cook_time.as_deref());
        let prep_time = TimeField::from_text(self.prep_time.as_deref());
        let total_time = duration::combine(&cook_time, &prep_time);

        Recipe {
            id: self.id,
            author_id: self.author_id,
            author_name: self.author_name,
            name: self.name,
            description: self.description,
            category: self.category,
            cook_time,
            prep_time,
            total_time,
            date_published: parse_timestamp(&self.date_published),
            aggregated_rating: self.aggregated_rating,
            review_count: self.review_count,
            nutrition: self.nutrition,
            servings: self.servings,
            recipe_yield: self.recipe_yield,
            ingredients,
        }
    }
}

/// A recipe as written at creation or import time.
pub struct NewRecipe<'a> {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub cook_time: &'a TimeField,
    pub prep_time: &'a TimeField,
    pub date_published: DateTime<Utc>,
    pub nutrition: &'a Nutrition,
    pub servings: Option<i32>,
    pub recipe_yield: Option<&'a str>,
}

pub struct ReviewRow {
    pub id: ReviewId,
    pub recipe_id: RecipeId,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub rating: i32,
    pub content: String,
    pub date_submitted: String,
    pub date_modified: String,
}

impl ReviewRow {
    pub fn into_review(self, likes: Vec<UserId>) -> Review {
        Review {
            id: self.id,
            recipe_id: self.recipe_id,
            author_id: self.author_id,
            author_name: self.author_name,
            rating: self.rating,
            content: self.content,
            date_submitted: parse_timestamp(&self.date_submitted),
            date_modified: parse_timestamp(&self.date_modified),
            likes,
        }
    }
}

/// The identifying columns of a review, used by ownership and existence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewHeader {
    pub id: ReviewId,
    pub recipe_id: RecipeId,
    pub author_id: UserId,
}

pub struct NewReview<'a> {
    pub id: ReviewId,
    pub recipe_id: RecipeId,
    pub author_id: UserId,
    pub rating: i32,
    pub content: &'a str,
    pub date_submitted: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

pub struct FeedRow {
    pub recipe_id: RecipeId,
    pub name: String,
    pub author_id: UserId,
    pub author_name: String,
    pub date_published: String,
    pub aggregated_rating: Option<f64>,
    pub review_count: i64,
}

impl From<FeedRow> for FeedItem {
    fn from(row: FeedRow) -> Self {
        FeedItem {
            recipe_id: row.recipe_id,
            name: row.name,
            author_id: row.author_id,
            author_name: row.author_name,
            date_published: parse_timestamp(&row.date_published),
            aggregated_rating: row.aggregated_rating,
            review_count: row.review_count,
        }
    }
}

pub struct FollowCountRow {
    pub user_id: UserId,
    pub name: String,
    pub followers: i64,
    pub following: i64,
}

pub struct IngredientCountRow {
    pub recipe_id: RecipeId,
    pub name: String,
    pub distinct_ingredients: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexically() {
        let early = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        let late = Utc.with_ymd_and_hms(2021, 11, 4, 5, 6, 7).unwrap();
        assert!(format_timestamp(&early) < format_timestamp(&late));
        assert_eq!(parse_timestamp(&format_timestamp(&late)), late);
    }

    #[test]
    fn sqlite_datetime_text_is_read_as_utc() {
        let ts = parse_timestamp("2020-01-02 03:04:05");
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn corrupt_timestamp_falls_back_to_epoch() {
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::default());
    }
}
