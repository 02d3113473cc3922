use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use forkful_db::models::NewRecipe;
use forkful_db::queries::recipes::{self, RecipeFilter};
use forkful_db::sequence::{self, IdKind};
use forkful_types::duration::TimeField;
use forkful_types::models::{AuthInfo, Page, Recipe, RecipeDraft, RecipeId};

use crate::Forkful;
use crate::error::{Entity, Result, ServiceError};
use crate::guard;
use crate::pagination::{PageRequest, RecipeSort};

/// Search filters. Empty strings are treated as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchParams<'a> {
    pub keyword: Option<&'a str>,
    pub category: Option<&'a str>,
    pub min_rating: Option<f64>,
}

/// Load a recipe with its ingredients, or `None` when absent or deleted.
pub(crate) fn load(conn: &Connection, id: RecipeId) -> anyhow::Result<Option<Recipe>> {
    match recipes::by_id(conn, id)? {
        Some(row) => Ok(Some(row.into_recipe(recipes::ingredients(conn, id)?))),
        None => Ok(None),
    }
}

fn strict_time(text: Option<&str>) -> Result<TimeField> {
    match text {
        Some(text) => Ok(TimeField::parse_strict(text)?),
        None => Ok(TimeField::absent()),
    }
}

impl Forkful {
    pub fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
        Ok(self.db.with_conn(|conn| load(conn, id))?)
    }

    pub fn search(
        &self,
        params: SearchParams<'_>,
        page: i64,
        size: i64,
        sort: RecipeSort,
    ) -> Result<Page<Recipe>> {
        let request = PageRequest::new(page, size)?;
        let filter = RecipeFilter {
            keyword: params.keyword,
            category: params.category,
            min_rating: params.min_rating,
        };
        let page = self.db.with_conn(|conn| {
            request.fetch(
                || recipes::search_count(conn, &filter),
                |limit, offset| {
                    recipes::search_page(conn, &filter, sort.order_by(), limit, offset)?
                        .into_iter()
                        .map(|row| -> anyhow::Result<Recipe> {
                            let ingredients = recipes::ingredients(conn, row.id)?;
                            Ok(row.into_recipe(ingredients))
                        })
                        .collect()
                },
            )
        })?;
        Ok(page)
    }

    /// Publish a new recipe authored by the caller. Supplied times must be valid
    /// ISO-8601 durations.
    pub fn create_recipe(&self, auth: Option<AuthInfo>, draft: &RecipeDraft) -> Result<RecipeId> {
        let id = self.db.transaction(|tx| -> Result<RecipeId> {
            let author = guard::require_active_user(tx, auth)?;
            if draft.name.trim().is_empty() {
                return Err(ServiceError::Validation("recipe name must not be empty".into()));
            }
            let cook_time = strict_time(draft.cook_time.as_deref())?;
            let prep_time = strict_time(draft.prep_time.as_deref())?;

            let id = sequence::next_id(tx, IdKind::Recipe)?;
            recipes::insert(
                tx,
                &NewRecipe {
                    id,
                    author_id: author,
                    name: &draft.name,
                    description: draft.description.as_deref(),
                    category: draft.category.as_deref(),
                    cook_time: &cook_time,
                    prep_time: &prep_time,
                    date_published: Utc::now(),
                    nutrition: &draft.nutrition,
                    servings: draft.servings,
                    recipe_yield: draft.recipe_yield.as_deref(),
                },
            )?;
            recipes::insert_ingredients(tx, id, &draft.ingredients)?;
            Ok(id)
        })?;

        info!("Created recipe {} ({})", id, draft.name);
        Ok(id)
    }

    /// Soft-delete a recipe. Only its author may do this.
    pub fn delete_recipe(&self, auth: Option<AuthInfo>, id: RecipeId) -> Result<()> {
        self.db.transaction(|tx| -> Result<()> {
            let caller = guard::require_active_user(tx, auth)?;
            let author = guard::require_recipe(tx, id)?;
            guard::require_ownership(caller, author, Entity::Recipe, id)?;
            recipes::soft_delete(tx, id)?;
            Ok(())
        })?;

        info!("Deleted recipe {}", id);
        Ok(())
    }

    /// Replace the cook and/or prep time. Malformed or negative durations are rejected.
    pub fn update_times(
        &self,
        auth: Option<AuthInfo>,
        id: RecipeId,
        cook_time: Option<&str>,
        prep_time: Option<&str>,
    ) -> Result<()> {
        self.db.transaction(|tx| -> Result<()> {
            let caller = guard::require_active_user(tx, auth)?;
            let author = guard::require_recipe(tx, id)?;
            guard::require_ownership(caller, author, Entity::Recipe, id)?;

            let cook = cook_time.map(TimeField::parse_strict).transpose()?;
            let prep = prep_time.map(TimeField::parse_strict).transpose()?;
            recipes::update_times(tx, id, cook.as_ref(), prep.as_ref())?;
            Ok(())
        })
    }
}
