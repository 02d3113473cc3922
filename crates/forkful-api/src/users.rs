use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use forkful_types::api::{DeleteAccountResponse, FeedQuery, FollowResponse, UpdateProfileRequest};
use forkful_types::models::{AuthInfo, UserId};

use crate::auth::{AppState, parse_gender};
use crate::error::ApiError;
use crate::extract::{JsonBody, Path, Query};
use crate::run_blocking;

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |app| app.get_user(id)).await?;
    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gender = parse_gender(req.gender.as_deref())?;
    run_blocking(&state, move |app| {
        app.update_profile(Some(auth), gender, req.age)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = run_blocking(&state, move |app| app.delete_account(Some(auth), id)).await?;
    Ok(Json(DeleteAccountResponse { deleted }))
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(target): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let following = run_blocking(&state, move |app| app.follow(Some(auth), target)).await?;
    Ok(Json(FollowResponse { following }))
}

pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = run_blocking(&state, move |app| app.followers(id)).await?;
    Ok(Json(ids))
}

pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = run_blocking(&state, move |app| app.following(id)).await?;
    Ok(Json(ids))
}

pub async fn feed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = run_blocking(&state, move |app| {
        app.feed(Some(auth), query.page, query.size, query.category.as_deref())
    })
    .await?;
    Ok(Json(page))
}

pub async fn follow_ratio(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let best = run_blocking(&state, |app| app.highest_follow_ratio()).await?;
    Ok(Json(best))
}
