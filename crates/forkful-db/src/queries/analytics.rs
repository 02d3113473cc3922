use anyhow::Result;
use rusqlite::Connection;

use forkful_types::models::RecipeId;

use crate::models::IngredientCountRow;

/// `(id, calories)` for every non-deleted recipe with known calories.
pub fn calorie_points(conn: &Connection) -> Result<Vec<(RecipeId, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT id, calories FROM recipes
         WHERE is_deleted = 0 AND calories IS NOT NULL
         ORDER BY id ASC",
    )?;
    let points = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(points)
}

/// Recipes with the most distinct ingredient names, ties by ascending id.
/// Recipes without ingredients never appear.
pub fn top_by_distinct_ingredients(conn: &Connection, k: u32) -> Result<Vec<IngredientCountRow>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.name, COUNT(DISTINCT ri.name) AS distinct_count
         FROM recipes r
         JOIN recipe_ingredients ri ON ri.recipe_id = r.id
         WHERE r.is_deleted = 0
         GROUP BY r.id, r.name
         ORDER BY distinct_count DESC, r.id ASC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([k], |row| {
            Ok(IngredientCountRow {
                recipe_id: row.get(0)?,
                name: row.get(1)?,
                distinct_ingredients: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations;

    #[test]
    fn distinct_names_are_counted_case_sensitively() {
        let conn = Connection::open_in_memory().unwrap();
        migrations::run(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, name, password, age) VALUES (1, 'a', 'pw', 30);
             INSERT INTO recipes (id, author_id, name, date_published, calories) VALUES
                 (1, 1, 'omelette', '2022-01-01T00:00:00.000000Z', 200.0),
                 (2, 1, 'toast', '2022-01-01T00:00:00.000000Z', NULL),
                 (3, 1, 'water', '2022-01-01T00:00:00.000000Z', 0.0);
             INSERT INTO recipe_ingredients (recipe_id, position, name) VALUES
                 (1, 0, 'egg'), (1, 1, 'egg'), (1, 2, 'flour'),
                 (2, 0, 'bread'), (2, 1, 'Bread');",
        )
        .unwrap();

        let rows = top_by_distinct_ingredients(&conn, 3).unwrap();
        let counts: Vec<_> = rows
            .iter()
            .map(|r| (r.recipe_id, r.distinct_ingredients))
            .collect();
        assert_eq!(counts, vec![(1, 2), (2, 2)]);

        assert_eq!(calorie_points(&conn).unwrap(), vec![(1, 200.0), (3, 0.0)]);
    }
}
