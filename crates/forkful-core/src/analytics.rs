//! Whole-dataset rankings: closest calorie pair, most distinct ingredients, highest
//! follower/following ratio.

use tracing::debug;

use forkful_db::models::FollowCountRow;
use forkful_db::queries::{analytics, follows};
use forkful_types::models::{CaloriePair, FollowRatio, IngredientCount, RecipeId};

use crate::Forkful;
use crate::error::Result;

const TOP_INGREDIENT_RECIPES: u32 = 3;

/// Calories in exact hundredths, so equal rounded values compare equal.
fn hundredths(calories: f64) -> i64 {
    (calories * 100.0).round() as i64
}

/// The pair `(a, b)`, `a < b`, with the smallest calorie difference. Ties go to the
/// smallest `(a, b)`.
///
/// Sorting by `(calories, id)` puts the winning pair next to each other: at difference
/// zero the two lowest ids of an equal run are adjacent, and at a positive minimum no
/// value can lie strictly between the two ends.
pub fn nearest_pair(points: &[(RecipeId, f64)]) -> Option<CaloriePair> {
    let mut sorted: Vec<(i64, RecipeId)> =
        points.iter().map(|&(id, cal)| (hundredths(cal), id)).collect();
    sorted.sort_unstable();

    sorted
        .windows(2)
        .map(|w| {
            let (lo, hi) = if w[0].1 < w[1].1 { (w[0], w[1]) } else { (w[1], w[0]) };
            ((w[1].0 - w[0].0, lo.1, hi.1), lo.0, hi.0)
        })
        .min_by_key(|&(key, _, _)| key)
        .map(|((diff, a, b), cal_a, cal_b)| CaloriePair {
            recipe_a: a,
            recipe_b: b,
            calories_a: cal_a as f64 / 100.0,
            calories_b: cal_b as f64 / 100.0,
            difference: diff as f64 / 100.0,
        })
}

/// Highest follower/following ratio; ties go to the lowest user id. Rows must
/// already be restricted to users following at least one account.
pub fn highest_ratio(rows: &[FollowCountRow]) -> Option<FollowRatio> {
    let mut best: Option<(&FollowCountRow, f64)> = None;
    for row in rows.iter().filter(|r| r.following > 0) {
        let ratio = row.followers as f64 / row.following as f64;
        let better = match best {
            None => true,
            Some((current, best_ratio)) => {
                ratio > best_ratio || (ratio == best_ratio && row.user_id < current.user_id)
            }
        };
        if better {
            best = Some((row, ratio));
        }
    }
    best.map(|(row, ratio)| FollowRatio {
        user_id: row.user_id,
        name: row.name.clone(),
        ratio,
    })
}

impl Forkful {
    pub fn closest_calorie_pair(&self) -> Result<Option<CaloriePair>> {
        let points = self.db.with_conn(analytics::calorie_points)?;
        let pair = nearest_pair(&points);
        debug!("Closest calorie pair over {} recipes: {:?}", points.len(), pair);
        Ok(pair)
    }

    pub fn top3_by_ingredient_count(&self) -> Result<Vec<IngredientCount>> {
        let rows = self.db.with_conn(|conn| {
            analytics::top_by_distinct_ingredients(conn, TOP_INGREDIENT_RECIPES)
        })?;
        Ok(rows
            .into_iter()
            .map(|row| IngredientCount {
                recipe_id: row.recipe_id,
                name: row.name,
                ingredient_count: row.distinct_ingredients,
            })
            .collect())
    }

    pub fn highest_follow_ratio(&self) -> Result<Option<FollowRatio>> {
        let rows = self.db.with_conn(follows::ratio_candidates)?;
        let best = highest_ratio(&rows);
        debug!("Highest follow ratio over {} users: {:?}", rows.len(), best);
        Ok(best)
    }
}
