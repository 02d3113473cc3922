use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use forkful_core::ReviewSort;
use forkful_types::api::{LikeResponse, PageQuery, ReviewCreatedResponse, ReviewRequest};
use forkful_types::models::{AuthInfo, RecipeId, ReviewId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, Path, Query};
use crate::run_blocking;

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(recipe_id): Path<RecipeId>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sort = ReviewSort::parse(query.sort.as_deref());
    let page = run_blocking(&state, move |app| {
        app.list_by_recipe(recipe_id, query.page, query.size, sort)
    })
    .await?;
    Ok(Json(page))
}

pub async fn add_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(recipe_id): Path<RecipeId>,
    JsonBody(req): JsonBody<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review_id = run_blocking(&state, move |app| {
        app.add_review(Some(auth), recipe_id, req.rating, &req.content)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewCreatedResponse {
            recipe_id,
            review_id,
        }),
    ))
}

pub async fn edit_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path((recipe_id, review_id)): Path<(RecipeId, ReviewId)>,
    JsonBody(req): JsonBody<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |app| {
        app.edit_review(Some(auth), recipe_id, review_id, req.rating, &req.content)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path((recipe_id, review_id)): Path<(RecipeId, ReviewId)>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |app| {
        app.delete_review(Some(auth), recipe_id, review_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh(
    State(state): State<AppState>,
    Path(recipe_id): Path<RecipeId>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = run_blocking(&state, move |app| app.refresh_aggregate(recipe_id)).await?;
    Ok(Json(recipe))
}

pub async fn like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(review_id): Path<ReviewId>,
) -> Result<impl IntoResponse, ApiError> {
    let likes = run_blocking(&state, move |app| app.like_review(Some(auth), review_id)).await?;
    Ok(Json(LikeResponse { review_id, likes }))
}

pub async fn unlike(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Path(review_id): Path<ReviewId>,
) -> Result<impl IntoResponse, ApiError> {
    let likes = run_blocking(&state, move |app| app.unlike_review(Some(auth), review_id)).await?;
    Ok(Json(LikeResponse { review_id, likes }))
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    use crate::testing::{app, create_recipe, register, send};

    async fn review(app: &Router, token: &str, recipe: i64, rating: i32) -> (StatusCode, Value) {
        send(
            app,
            Method::POST,
            &format!("/recipes/{recipe}/reviews"),
            Some(token),
            Some(json!({ "rating": rating, "content": "tasty" })),
        )
        .await
    }

    #[tokio::test]
    async fn reviews_keep_the_aggregate_current() {
        let app = app();
        let (_, alice) = register(&app, "alice").await;
        let (_, bob) = register(&app, "bob").await;
        let (_, carol) = register(&app, "carol").await;
        let recipe = create_recipe(&app, &alice, json!({ "name": "Stew" })).await;

        let (status, body) = review(&app, &bob, recipe, 5).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["recipe_id"], recipe);
        let bob_review = body["review_id"].as_i64().unwrap();
        review(&app, &carol, recipe, 2).await;

        let (_, body) = send(&app, Method::GET, &format!("/recipes/{recipe}"), None, None).await;
        assert_eq!(body["aggregated_rating"], 3.5);
        assert_eq!(body["review_count"], 2);

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/recipes/{recipe}/reviews/{bob_review}"),
            Some(&bob),
            Some(json!({ "rating": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/recipes/{recipe}/reviews/{bob_review}"),
            Some(&carol),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/recipes/{recipe}/reviews/{bob_review}"),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) =
            send(&app, Method::POST, &format!("/recipes/{recipe}/refresh"), Some(&alice), None)
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["aggregated_rating"], 2.0);
        assert_eq!(body["review_count"], 1);
    }

    #[tokio::test]
    async fn out_of_range_ratings_are_rejected() {
        let app = app();
        let (_, alice) = register(&app, "alice").await;
        let (_, bob) = register(&app, "bob").await;
        let recipe = create_recipe(&app, &alice, json!({ "name": "Stew" })).await;

        let (status, body) = review(&app, &bob, recipe, 6).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_rating");

        let (status, body) = review(&app, &bob, 999, 4).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn likes_are_idempotent_and_never_self() {
        let app = app();
        let (_, alice) = register(&app, "alice").await;
        let (_, bob) = register(&app, "bob").await;
        let recipe = create_recipe(&app, &alice, json!({ "name": "Stew" })).await;
        let (_, body) = review(&app, &bob, recipe, 4).await;
        let review_id = body["review_id"].as_i64().unwrap();
        let like_uri = format!("/reviews/{review_id}/like");

        for _ in 0..2 {
            let (status, body) = send(&app, Method::POST, &like_uri, Some(&alice), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["likes"], 1);
        }

        let (status, body) = send(&app, Method::POST, &like_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "self_like_rejected");

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/recipes/{recipe}/reviews?sort=likes_desc"),
            None,
            None,
        )
        .await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["likes"].as_array().map(Vec::len), Some(1));

        let (status, body) = send(&app, Method::DELETE, &like_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["likes"], 0);
    }
}
