use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use forkful_core::error::{Entity, ServiceError};
use forkful_core::{RecipeSort, SearchParams};
use forkful_types::api::{CreatedResponse, SearchQuery, UpdateTimesRequest};
use forkful_types::models::{AuthInfo, RecipeDraft, RecipeId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, Path, Query};
use crate::run_blocking;

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sort = RecipeSort::parse(query.sort.as_deref());
    let page = run_blocking(&state, move |app| {
        let params = SearchParams {
            keyword: query.keyword.as_deref(),
            category: query.category.as_deref(),
            min_rating: query.min_rating,
        };
        app.search(params, query.page, query.size, sort)
    })
    .await?;
    Ok(Json(page))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = run_blocking(&state, move |app| app.get_recipe(id))
        .await?
        .ok_or(ServiceError::not_found(Entity::Recipe, id))?;
    Ok(Json(recipe))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(draft): JsonBody<RecipeDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let id = run_blocking(&state, move |app| app.create_recipe(Some(auth), &draft)).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(id): Path<RecipeId>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |app| app.delete_recipe(Some(auth), id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_times(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(id): Path<RecipeId>,
    JsonBody(req): JsonBody<UpdateTimesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |app| {
        app.update_times(
            Some(auth),
            id,
            req.cook_time.as_deref(),
            req.prep_time.as_deref(),
        )
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn closest_calories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = run_blocking(&state, |app| app.closest_calorie_pair()).await?;
    Ok(Json(pair))
}

pub async fn most_ingredients(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let top = run_blocking(&state, |app| app.top3_by_ingredient_count()).await?;
    Ok(Json(top))
}
