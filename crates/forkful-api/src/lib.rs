//! HTTP surface for the recipe platform.

pub mod auth;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod recipes;
pub mod reviews;
pub mod users;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
};
use tracing::error;

use forkful_core::Forkful;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// Run a blocking service call on the blocking pool.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Forkful) -> forkful_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state.forkful))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?;
    Ok(result?)
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/followers", get(users::followers))
        .route("/users/{id}/following", get(users::following))
        .route("/recipes", get(recipes::search))
        .route("/recipes/{id}", get(recipes::get_recipe))
        .route("/recipes/{id}/reviews", get(reviews::list_reviews))
        .route("/analytics/closest-calories", get(recipes::closest_calories))
        .route("/analytics/most-ingredients", get(recipes::most_ingredients))
        .route("/analytics/follow-ratio", get(users::follow_ratio));

    let protected_routes = Router::new()
        .route("/users/me", patch(users::update_profile))
        .route("/users/{id}", delete(users::delete_account))
        .route("/users/{id}/follow", post(users::follow))
        .route("/feed", get(users::feed))
        .route("/recipes", post(recipes::create_recipe))
        .route("/recipes/{id}", delete(recipes::delete_recipe))
        .route("/recipes/{id}/times", patch(recipes::update_times))
        .route("/recipes/{id}/reviews", post(reviews::add_review))
        .route("/recipes/{id}/reviews/{review_id}", put(reviews::edit_review))
        .route("/recipes/{id}/reviews/{review_id}", delete(reviews::delete_review))
        .route("/recipes/{id}/refresh", post(reviews::refresh))
        .route("/reviews/{id}/like", post(reviews::like))
        .route("/reviews/{id}/like", delete(reviews::unlike))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
