use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};

use forkful_types::duration::TimeField;
use forkful_types::models::{Nutrition, RecipeId, UserId};

use super::{OptionalExt, like_pattern};
use crate::models::{FeedRow, NewRecipe, RecipeRow, format_timestamp};

const RECIPE_COLUMNS: &str = "r.id, r.author_id, u.name, r.name, r.description, r.category,
    r.cook_time_iso, r.prep_time_iso, r.date_published, r.aggregated_rating, r.review_count,
    r.calories, r.fat, r.saturated_fat, r.cholesterol, r.sodium, r.carbohydrate, r.fiber,
    r.sugar, r.protein, r.servings, r.yield";

fn map_recipe(row: &Row<'_>) -> rusqlite::Result<RecipeRow> {
    Ok(RecipeRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        cook_time: row.get(6)?,
        prep_time: row.get(7)?,
        date_published: row.get(8)?,
        aggregated_rating: row.get(9)?,
        review_count: row.get(10)?,
        nutrition: Nutrition {
            calories: row.get(11)?,
            fat: row.get(12)?,
            saturated_fat: row.get(13)?,
            cholesterol: row.get(14)?,
            sodium: row.get(15)?,
            carbohydrate: row.get(16)?,
            fiber: row.get(17)?,
            sugar: row.get(18)?,
            protein: row.get(19)?,
        },
        servings: row.get(20)?,
        recipe_yield: row.get(21)?,
    })
}

/// A non-deleted recipe with its author's name.
pub fn by_id(conn: &Connection, id: RecipeId) -> Result<Option<RecipeRow>> {
    let sql = format!(
        "SELECT {RECIPE_COLUMNS}
         FROM recipes r LEFT JOIN users u ON u.id = r.author_id
         WHERE r.id = ?1 AND r.is_deleted = 0"
    );
    conn.query_row(&sql, [id], map_recipe).optional()
}

/// Author of a non-deleted recipe.
pub fn author_of(conn: &Connection, id: RecipeId) -> Result<Option<UserId>> {
    conn.query_row(
        "SELECT author_id FROM recipes WHERE id = ?1 AND is_deleted = 0",
        [id],
        |row| row.get(0),
    )
    .optional()
}

/// Ingredient names in position order.
pub fn ingredients(conn: &Connection, id: RecipeId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY position ASC",
    )?;
    let names = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

pub fn insert(conn: &Connection, recipe: &NewRecipe<'_>) -> Result<()> {
    let n = recipe.nutrition;
    conn.execute(
        "INSERT INTO recipes (id, author_id, name, description, category,
             cook_time_iso, cook_time_sec, prep_time_iso, prep_time_sec, date_published,
             calories, fat, saturated_fat, cholesterol, sodium, carbohydrate, fiber, sugar,
             protein, servings, yield)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
             ?18, ?19, ?20, ?21)",
        rusqlite::params![
            recipe.id,
            recipe.author_id,
            recipe.name,
            recipe.description,
            recipe.category,
            recipe.cook_time.text(),
            recipe.cook_time.seconds(),
            recipe.prep_time.text(),
            recipe.prep_time.seconds(),
            format_timestamp(&recipe.date_published),
            n.calories,
            n.fat,
            n.saturated_fat,
            n.cholesterol,
            n.sodium,
            n.carbohydrate,
            n.fiber,
            n.sugar,
            n.protein,
            recipe.servings,
            recipe.recipe_yield,
        ],
    )?;
    Ok(())
}

/// Store ingredients at positions `0..n`.
pub fn insert_ingredients(conn: &Connection, id: RecipeId, names: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO recipe_ingredients (recipe_id, position, name) VALUES (?1, ?2, ?3)",
    )?;
    for (position, name) in names.iter().enumerate() {
        stmt.execute(rusqlite::params![id, position as i64, name])?;
    }
    Ok(())
}

pub fn soft_delete(conn: &Connection, id: RecipeId) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE recipes SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
        [id],
    )?;
    Ok(changed)
}

/// Replace the cook and/or prep time. Text and seconds are written together.
pub fn update_times(
    conn: &Connection,
    id: RecipeId,
    cook: Option<&TimeField>,
    prep: Option<&TimeField>,
) -> Result<()> {
    if let Some(cook) = cook {
        conn.execute(
            "UPDATE recipes SET cook_time_iso = ?2, cook_time_sec = ?3 WHERE id = ?1",
            rusqlite::params![id, cook.text(), cook.seconds()],
        )?;
    }
    if let Some(prep) = prep {
        conn.execute(
            "UPDATE recipes SET prep_time_iso = ?2, prep_time_sec = ?3 WHERE id = ?1",
            rusqlite::params![id, prep.text(), prep.seconds()],
        )?;
    }
    Ok(())
}

/// Write the derived rating columns. Only the aggregate recalculator calls this.
pub fn set_aggregate(
    conn: &Connection,
    id: RecipeId,
    rating: Option<f64>,
    review_count: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE recipes SET aggregated_rating = ?2, review_count = ?3 WHERE id = ?1",
        rusqlite::params![id, rating, review_count],
    )?;
    Ok(())
}

// -- Search --

#[derive(Debug, Clone, Copy, Default)]
pub struct RecipeFilter<'a> {
    /// Literal, case-insensitive substring of name or description.
    pub keyword: Option<&'a str>,
    pub category: Option<&'a str>,
    pub min_rating: Option<f64>,
}

impl RecipeFilter<'_> {
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("WHERE r.is_deleted = 0");
        let mut params = Vec::new();

        if let Some(keyword) = self.keyword.filter(|k| !k.is_empty()) {
            params.push(Value::Text(like_pattern(keyword)));
            let idx = params.len();
            sql.push_str(&format!(
                " AND (r.name LIKE ?{idx} ESCAPE '\\' OR r.description LIKE ?{idx} ESCAPE '\\')"
            ));
        }
        if let Some(category) = self.category.filter(|c| !c.is_empty()) {
            params.push(Value::Text(category.to_string()));
            sql.push_str(&format!(" AND r.category = ?{}", params.len()));
        }
        if let Some(min) = self.min_rating {
            params.push(Value::Real(min));
            sql.push_str(&format!(" AND r.aggregated_rating >= ?{}", params.len()));
        }
        (sql, params)
    }
}

pub fn search_count(conn: &Connection, filter: &RecipeFilter<'_>) -> Result<u64> {
    let (where_sql, params) = filter.where_clause();
    let sql = format!("SELECT COUNT(*) FROM recipes r {where_sql}");
    let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
    Ok(count as u64)
}

/// One window of matching recipes. `order_by` must be a trusted, fully-determined clause.
pub fn search_page(
    conn: &Connection,
    filter: &RecipeFilter<'_>,
    order_by: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<RecipeRow>> {
    let (where_sql, mut params) = filter.where_clause();
    params.push(Value::Integer(limit as i64));
    params.push(Value::Integer(offset as i64));
    let sql = format!(
        "SELECT {RECIPE_COLUMNS}
         FROM recipes r LEFT JOIN users u ON u.id = r.author_id
         {where_sql}
         ORDER BY {order_by}
         LIMIT ?{} OFFSET ?{}",
        params.len() - 1,
        params.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), map_recipe)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Feed --

fn feed_clause(category: Option<&str>) -> (&'static str, Vec<Value>) {
    match category.filter(|c| !c.is_empty()) {
        Some(c) => (
            "WHERE f.follower_id = ?1 AND r.is_deleted = 0 AND r.category = ?2",
            vec![Value::Text(c.to_string())],
        ),
        None => ("WHERE f.follower_id = ?1 AND r.is_deleted = 0", Vec::new()),
    }
}

pub fn feed_count(conn: &Connection, follower: UserId, category: Option<&str>) -> Result<u64> {
    let (where_sql, extra) = feed_clause(category);
    let mut params = vec![Value::Integer(follower)];
    params.extend(extra);
    let sql = format!(
        "SELECT COUNT(*)
         FROM recipes r JOIN user_follows f ON f.followee_id = r.author_id
         {where_sql}"
    );
    let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
    Ok(count as u64)
}

/// Recipes authored by accounts `follower` follows.
pub fn feed_page(
    conn: &Connection,
    follower: UserId,
    category: Option<&str>,
    order_by: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<FeedRow>> {
    let (where_sql, extra) = feed_clause(category);
    let mut params = vec![Value::Integer(follower)];
    params.extend(extra);
    params.push(Value::Integer(limit as i64));
    params.push(Value::Integer(offset as i64));
    let sql = format!(
        "SELECT r.id, r.name, r.author_id, u.name, r.date_published, r.aggregated_rating,
                r.review_count
         FROM recipes r
         JOIN users u ON u.id = r.author_id
         JOIN user_follows f ON f.followee_id = r.author_id
         {where_sql}
         ORDER BY {order_by}
         LIMIT ?{} OFFSET ?{}",
        params.len() - 1,
        params.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(FeedRow {
                recipe_id: row.get(0)?,
                name: row.get(1)?,
                author_id: row.get(2)?,
                author_name: row.get(3)?,
                date_published: row.get(4)?,
                aggregated_rating: row.get(5)?,
                review_count: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
