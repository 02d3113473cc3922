use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::TimeField;

pub type UserId = i64;
pub type RecipeId = i64;
pub type ReviewId = i64;

/// Identity of the caller for mutating operations. Passwords are checked at login only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub user_id: UserId,
}

impl AuthInfo {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gender '{0}'")]
pub struct ParseGenderError(pub String);

impl FromStr for Gender {
    type Err = ParseGenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "unknown" => Ok(Gender::Unknown),
            _ => Err(ParseGenderError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub gender: Gender,
    pub age: i32,
    pub role: String,
    pub is_deleted: bool,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Nutrition facts per serving. Any field may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nutrition {
    pub calories: Option<f64>,
    pub fat: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub cholesterol: Option<f64>,
    pub sodium: Option<f64>,
    pub carbohydrate: Option<f64>,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub protein: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cook_time: TimeField,
    pub prep_time: TimeField,
    /// `None` when either time could not be parsed.
    pub total_time: Option<String>,
    pub date_published: DateTime<Utc>,
    pub aggregated_rating: Option<f64>,
    pub review_count: i64,
    pub nutrition: Nutrition,
    pub servings: Option<i32>,
    pub recipe_yield: Option<String>,
    pub ingredients: Vec<String>,
}

/// Input for a new recipe. Rating and review count are derived and have no field here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecipeDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
    pub nutrition: Nutrition,
    pub servings: Option<i32>,
    pub recipe_yield: Option<String>,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub recipe_id: RecipeId,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub rating: i32,
    pub content: String,
    pub date_submitted: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    /// Liking user ids, ascending.
    pub likes: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub recipe_id: RecipeId,
    pub name: String,
    pub author_id: UserId,
    pub author_name: String,
    pub date_published: DateTime<Utc>,
    pub aggregated_rating: Option<f64>,
    pub review_count: i64,
}

/// One window of a listing. `total` counts every matching row, not just this page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

// -- Analytics --

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaloriePair {
    pub recipe_a: RecipeId,
    pub recipe_b: RecipeId,
    pub calories_a: f64,
    pub calories_b: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientCount {
    pub recipe_id: RecipeId,
    pub name: String,
    pub ingredient_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowRatio {
    pub user_id: UserId,
    pub name: String,
    pub ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("male".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!(" FEMALE ".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("Unknown".parse::<Gender>(), Ok(Gender::Unknown));
        assert!("other".parse::<Gender>().is_err());
    }

    #[test]
    fn page_map_keeps_window_metadata() {
        let page = Page {
            items: vec![1, 2],
            page: 3,
            size: 2,
            total: 9,
        };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!((mapped.page, mapped.size, mapped.total), (3, 2, 9));
    }
}
