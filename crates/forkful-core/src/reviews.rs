use chrono::Utc;
use tracing::{debug, info};

use forkful_db::models::NewReview;
use forkful_db::queries::reviews;
use forkful_db::sequence::{self, IdKind};
use forkful_types::models::{AuthInfo, Page, Recipe, RecipeId, Review, ReviewId};

use crate::Forkful;
use crate::aggregate;
use crate::error::{Entity, Result, ServiceError};
use crate::guard;
use crate::pagination::{PageRequest, ReviewSort};
use crate::recipes;

fn validate_rating(rating: i32) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ServiceError::InvalidRating(rating))
    }
}

impl Forkful {
    /// Review a recipe. The recipe's aggregate is recomputed before the review commits.
    pub fn add_review(
        &self,
        auth: Option<AuthInfo>,
        recipe_id: RecipeId,
        rating: i32,
        content: &str,
    ) -> Result<ReviewId> {
        let id = self.db.transaction(|tx| -> Result<ReviewId> {
            let author = guard::require_active_user(tx, auth)?;
            guard::require_recipe(tx, recipe_id)?;
            validate_rating(rating)?;

            let id = sequence::next_id(tx, IdKind::Review)?;
            let now = Utc::now();
            reviews::insert(
                tx,
                &NewReview {
                    id,
                    recipe_id,
                    author_id: author,
                    rating,
                    content,
                    date_submitted: now,
                    date_modified: now,
                },
            )?;
            aggregate::recompute(tx, recipe_id)?;
            Ok(id)
        })?;

        info!("Review {} added to recipe {}", id, recipe_id);
        Ok(id)
    }

    pub fn edit_review(
        &self,
        auth: Option<AuthInfo>,
        recipe_id: RecipeId,
        review_id: ReviewId,
        rating: i32,
        content: &str,
    ) -> Result<()> {
        self.db.transaction(|tx| -> Result<()> {
            let caller = guard::require_active_user(tx, auth)?;
            let review = guard::require_review(tx, review_id, Some(recipe_id))?;
            guard::require_ownership(caller, review.author_id, Entity::Review, review_id)?;
            validate_rating(rating)?;

            reviews::update(tx, review_id, rating, content, Utc::now())?;
            aggregate::recompute(tx, recipe_id)?;
            Ok(())
        })
    }

    /// Remove a review and its likes.
    pub fn delete_review(
        &self,
        auth: Option<AuthInfo>,
        recipe_id: RecipeId,
        review_id: ReviewId,
    ) -> Result<()> {
        self.db.transaction(|tx| -> Result<()> {
            let caller = guard::require_active_user(tx, auth)?;
            let review = guard::require_review(tx, review_id, Some(recipe_id))?;
            guard::require_ownership(caller, review.author_id, Entity::Review, review_id)?;

            reviews::delete(tx, review_id)?;
            aggregate::recompute(tx, recipe_id)?;
            Ok(())
        })?;

        info!("Review {} deleted from recipe {}", review_id, recipe_id);
        Ok(())
    }

    /// Like a review; liking twice is a no-op. Returns the like count.
    pub fn like_review(&self, auth: Option<AuthInfo>, review_id: ReviewId) -> Result<i64> {
        self.db.transaction(|tx| -> Result<i64> {
            let caller = guard::require_active_user(tx, auth)?;
            let review = guard::require_review(tx, review_id, None)?;
            if review.author_id == caller {
                return Err(ServiceError::SelfLikeRejected);
            }
            reviews::insert_like(tx, review_id, caller)?;
            Ok(reviews::like_count(tx, review_id)?)
        })
    }

    /// Withdraw a like; unliking a review that was not liked is a no-op.
    pub fn unlike_review(&self, auth: Option<AuthInfo>, review_id: ReviewId) -> Result<i64> {
        self.db.transaction(|tx| -> Result<i64> {
            let caller = guard::require_active_user(tx, auth)?;
            guard::require_review(tx, review_id, None)?;
            reviews::delete_like(tx, review_id, caller)?;
            Ok(reviews::like_count(tx, review_id)?)
        })
    }

    pub fn list_by_recipe(
        &self,
        recipe_id: RecipeId,
        page: i64,
        size: i64,
        sort: ReviewSort,
    ) -> Result<Page<Review>> {
        let request = PageRequest::new(page, size)?;
        self.db.read(|conn| -> Result<_> {
            guard::require_recipe(conn, recipe_id)?;
            let page = request.fetch(
                || reviews::count_for_recipe(conn, recipe_id),
                |limit, offset| {
                    reviews::page_for_recipe(conn, recipe_id, sort.order_by(), limit, offset)?
                        .into_iter()
                        .map(|row| -> anyhow::Result<Review> {
                            let likes = reviews::likes(conn, row.id)?;
                            Ok(row.into_review(likes))
                        })
                        .collect()
                },
            )?;
            Ok(page)
        })
    }

    /// Recompute a recipe's aggregate from its reviews and return the refreshed recipe.
    pub fn refresh_aggregate(&self, recipe_id: RecipeId) -> Result<Recipe> {
        let recipe = self.db.transaction(|tx| -> Result<Option<Recipe>> {
            guard::require_recipe(tx, recipe_id)?;
            aggregate::recompute(tx, recipe_id)?;
            Ok(recipes::load(tx, recipe_id)?)
        })?;
        debug!("Refreshed aggregate of recipe {}", recipe_id);
        guard::require_exists(recipe, Entity::Recipe, recipe_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{
        self, ALICE, BOB, CAROL, DAVE, GHOST, SALAD, SOUP, SOUP_REVIEW, STEW, STEW_REVIEW_ALICE,
        STEW_REVIEW_BOB, as_user,
    };

    fn rating_of(app: &Forkful, recipe: RecipeId) -> (Option<f64>, i64) {
        let recipe = app.get_recipe(recipe).unwrap().unwrap();
        (recipe.aggregated_rating, recipe.review_count)
    }

    #[test]
    fn every_review_mutation_recomputes_the_aggregate() {
        let app = testing::fixture();
        assert_eq!(rating_of(&app, SALAD), (None, 0));

        let first = app.add_review(as_user(BOB), SALAD, 5, "crisp").unwrap();
        assert_eq!(rating_of(&app, SALAD), (Some(5.0), 1));

        app.add_review(as_user(CAROL), SALAD, 4, "").unwrap();
        app.add_review(as_user(DAVE), SALAD, 4, "fine").unwrap();
        assert_eq!(rating_of(&app, SALAD), (Some(4.33), 3));

        app.edit_review(as_user(BOB), SALAD, first, 1, "soggy").unwrap();
        assert_eq!(rating_of(&app, SALAD), (Some(3.0), 3));

        app.delete_review(as_user(BOB), SALAD, first).unwrap();
        assert_eq!(rating_of(&app, SALAD), (Some(4.0), 2));
    }

    #[test]
    fn deleting_the_last_review_clears_the_rating() {
        let app = testing::fixture();
        app.delete_review(as_user(CAROL), SOUP, SOUP_REVIEW).unwrap();
        assert_eq!(rating_of(&app, SOUP), (None, 0));
    }

    #[test]
    fn invalid_rating_leaves_no_trace() {
        let app = testing::fixture();
        for rating in [0, 6, -3] {
            let err = app.add_review(as_user(BOB), SALAD, rating, "x").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRating);
        }
        assert_eq!(rating_of(&app, SALAD), (None, 0));
        let page = app.list_by_recipe(SALAD, 1, 10, ReviewSort::IdAsc).unwrap();
        assert_eq!(page.total, 0);

        let err = app
            .edit_review(as_user(ALICE), STEW, STEW_REVIEW_ALICE, 9, "x")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRating);
        assert_eq!(rating_of(&app, STEW), (Some(3.5), 2));
    }

    #[test]
    fn review_errors_follow_existence_then_ownership_then_rating() {
        let app = testing::fixture();
        let kind = |r: Result<()>| r.unwrap_err().kind();

        // review exists but under another recipe
        let wrong_recipe = app.edit_review(as_user(CAROL), STEW, SOUP_REVIEW, 9, "");
        assert_eq!(kind(wrong_recipe), ErrorKind::NotFound);
        let not_mine = app.edit_review(as_user(BOB), STEW, STEW_REVIEW_ALICE, 9, "");
        assert_eq!(kind(not_mine), ErrorKind::NotOwner);
        let not_mine = app.delete_review(as_user(BOB), STEW, STEW_REVIEW_ALICE);
        assert_eq!(kind(not_mine), ErrorKind::NotOwner);

        let err = app.add_review(as_user(BOB), 999, 9, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = app.add_review(as_user(GHOST), SALAD, 3, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccountInactive);
    }

    #[test]
    fn likes_are_idempotent_and_never_self() {
        let app = testing::fixture();
        assert_eq!(app.like_review(as_user(ALICE), SOUP_REVIEW).unwrap(), 1);
        assert_eq!(app.like_review(as_user(ALICE), SOUP_REVIEW).unwrap(), 1);
        assert_eq!(app.like_review(as_user(BOB), SOUP_REVIEW).unwrap(), 2);

        let err = app.like_review(as_user(CAROL), SOUP_REVIEW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SelfLikeRejected);
        // the store refuses it even when the service is bypassed
        let direct = app
            .db()
            .with_conn(|conn| reviews::insert_like(conn, SOUP_REVIEW, CAROL));
        assert!(direct.is_err());

        assert_eq!(app.unlike_review(as_user(ALICE), SOUP_REVIEW).unwrap(), 1);
        assert_eq!(app.unlike_review(as_user(ALICE), SOUP_REVIEW).unwrap(), 1);
        assert_eq!(app.unlike_review(as_user(CAROL), SOUP_REVIEW).unwrap(), 1);

        let err = app.like_review(as_user(ALICE), 999).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let page = app.list_by_recipe(SOUP, 1, 10, ReviewSort::IdAsc).unwrap();
        assert_eq!(page.items[0].likes, vec![BOB]);
    }

    #[test]
    fn listing_sorts_by_likes_then_id() {
        let app = testing::fixture();
        app.like_review(as_user(CAROL), STEW_REVIEW_BOB).unwrap();

        let page = app.list_by_recipe(STEW, 1, 10, ReviewSort::LikesDesc).unwrap();
        let ids: Vec<_> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![STEW_REVIEW_BOB, STEW_REVIEW_ALICE]);
        assert_eq!(page.items[0].author_name.as_deref(), Some("bob"));

        let page = app.list_by_recipe(STEW, 1, 10, ReviewSort::IdAsc).unwrap();
        let ids: Vec<_> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![STEW_REVIEW_ALICE, STEW_REVIEW_BOB]);

        // equal modification times fall back to id
        let page = app.list_by_recipe(STEW, 1, 1, ReviewSort::DateDesc).unwrap();
        assert_eq!((page.items[0].id, page.total), (STEW_REVIEW_ALICE, 2));
    }

    #[test]
    fn editing_moves_a_review_to_the_front_by_date() {
        let app = testing::fixture();
        app.edit_review(as_user(BOB), STEW, STEW_REVIEW_BOB, 3, "better second time")
            .unwrap();
        let page = app.list_by_recipe(STEW, 1, 10, ReviewSort::DateDesc).unwrap();
        assert_eq!(page.items[0].id, STEW_REVIEW_BOB);
        assert_eq!(page.items[0].content, "better second time");
        assert!(page.items[0].date_modified > page.items[0].date_submitted);
    }

    #[test]
    fn listing_validates_page_then_recipe() {
        let app = testing::fixture();
        let err = app.list_by_recipe(999, 0, 10, ReviewSort::IdAsc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPageRequest);
        let err = app.list_by_recipe(999, 1, 10, ReviewSort::IdAsc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn refresh_repairs_a_stale_aggregate() {
        let app = testing::fixture();
        app.db()
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE recipes SET aggregated_rating = NULL, review_count = 0 WHERE id = ?1",
                    [STEW],
                )?;
                Ok(())
            })
            .unwrap();
        assert_eq!(rating_of(&app, STEW), (None, 0));

        let recipe = app.refresh_aggregate(STEW).unwrap();
        assert_eq!((recipe.aggregated_rating, recipe.review_count), (Some(3.5), 2));
        assert_eq!(app.refresh_aggregate(999).unwrap_err().kind(), ErrorKind::NotFound);
    }
}
