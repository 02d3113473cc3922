use serde::{Deserialize, Serialize};

use crate::models::{RecipeId, ReviewId, UserId};

// -- JWT Claims --

/// Bearer token claims. `sub` is the authenticated user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    pub gender: Option<String>,
    /// `YYYY-MM-DD`
    pub birthdate: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub user_id: UserId,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub token: String,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub gender: Option<String>,
    pub age: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub following: bool,
}

// -- Listings --

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub category: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

// -- Recipes --

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTimesRequest {
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
}

// -- Reviews --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub review_id: ReviewId,
    pub likes: i64,
}

#[derive(Debug, Serialize)]
pub struct ReviewCreatedResponse {
    pub recipe_id: RecipeId,
    pub review_id: ReviewId,
}
