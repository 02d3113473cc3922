//! Page windows and the closed set of sort keys for listings.
//!
//! Every ORDER BY clause produced here ends in an id tie-break, so a listing over an
//! unchanged dataset always returns the same rows in the same order.

use forkful_types::models::Page;

use crate::error::{Result, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Validates before any query runs: `page >= 1` and `size >= 1`.
    pub fn new(page: i64, size: i64) -> Result<Self> {
        let invalid = || ServiceError::InvalidPageRequest { page, size };
        if page < 1 || size < 1 {
            return Err(invalid());
        }
        Ok(Self {
            page: u32::try_from(page).map_err(|_| invalid())?,
            size: u32::try_from(size).map_err(|_| invalid())?,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    /// Count the filtered set, then fetch the window. A window past the end is empty
    /// and skips the fetch; `total` is reported either way.
    pub fn fetch<T, C, F>(&self, count: C, fetch: F) -> anyhow::Result<Page<T>>
    where
        C: FnOnce() -> anyhow::Result<u64>,
        F: FnOnce(u64, u64) -> anyhow::Result<Vec<T>>,
    {
        let total = count()?;
        let items = if self.offset() >= total {
            Vec::new()
        } else {
            fetch(self.limit(), self.offset())?
        };
        Ok(Page {
            items,
            page: self.page,
            size: self.size,
            total,
        })
    }
}

/// Recipe listing order. Unknown or missing keys fall back to `IdAsc`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecipeSort {
    RatingDesc,
    DateDesc,
    CaloriesAsc,
    #[default]
    IdAsc,
}

impl RecipeSort {
    pub fn parse(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            Some(k) if k.eq_ignore_ascii_case("rating_desc") => RecipeSort::RatingDesc,
            Some(k) if k.eq_ignore_ascii_case("date_desc") => RecipeSort::DateDesc,
            Some(k) if k.eq_ignore_ascii_case("calories_asc") => RecipeSort::CaloriesAsc,
            _ => RecipeSort::IdAsc,
        }
    }

    /// Clause over the `r` alias of `recipes`.
    pub fn order_by(&self) -> &'static str {
        match self {
            RecipeSort::RatingDesc => "r.aggregated_rating DESC NULLS LAST, r.id ASC",
            RecipeSort::DateDesc => "r.date_published DESC, r.id ASC",
            RecipeSort::CaloriesAsc => "r.calories ASC NULLS LAST, r.id ASC",
            RecipeSort::IdAsc => "r.id ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewSort {
    LikesDesc,
    DateDesc,
    #[default]
    IdAsc,
}

impl ReviewSort {
    pub fn parse(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            Some(k) if k.eq_ignore_ascii_case("likes_desc") => ReviewSort::LikesDesc,
            Some(k) if k.eq_ignore_ascii_case("date_desc") => ReviewSort::DateDesc,
            _ => ReviewSort::IdAsc,
        }
    }

    /// Clause over the `r` alias of `reviews`.
    pub fn order_by(&self) -> &'static str {
        match self {
            ReviewSort::LikesDesc => {
                "(SELECT COUNT(*) FROM review_likes l WHERE l.review_id = r.id) DESC, r.id ASC"
            }
            ReviewSort::DateDesc => "r.date_modified DESC, r.id ASC",
            ReviewSort::IdAsc => "r.id ASC",
        }
    }
}

/// Feed order: newest first, then highest id.
pub const FEED_ORDER: &str = "r.date_published DESC, r.id DESC";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn rejects_non_positive_page_or_size() {
        for (page, size) in [(0, 10), (-1, 10), (1, 0), (1, -5), (i64::MAX, 10)] {
            let err = PageRequest::new(page, size).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPageRequest, "{page}/{size}");
        }
        let req = PageRequest::new(3, 20).unwrap();
        assert_eq!((req.limit(), req.offset()), (20, 40));
    }

    #[test]
    fn window_past_the_end_is_empty_with_total() {
        let req = PageRequest::new(100, 10).unwrap();
        let page: Page<i32> = req
            .fetch(|| Ok(5), |_, _| panic!("fetch must be skipped"))
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!((page.page, page.size, page.total), (100, 10, 5));
    }

    #[test]
    fn unknown_sort_keys_fall_back_to_id() {
        assert_eq!(RecipeSort::parse(Some("RATING_DESC")), RecipeSort::RatingDesc);
        assert_eq!(RecipeSort::parse(Some("popularity")), RecipeSort::IdAsc);
        assert_eq!(RecipeSort::parse(None), RecipeSort::IdAsc);
        assert_eq!(ReviewSort::parse(Some("likes_desc")), ReviewSort::LikesDesc);
        assert_eq!(ReviewSort::parse(Some("")), ReviewSort::IdAsc);
    }

    #[test]
    fn every_order_ends_with_an_id_tie_break() {
        let clauses = [
            RecipeSort::RatingDesc.order_by(),
            RecipeSort::DateDesc.order_by(),
            RecipeSort::CaloriesAsc.order_by(),
            RecipeSort::IdAsc.order_by(),
            ReviewSort::LikesDesc.order_by(),
            ReviewSort::DateDesc.order_by(),
            ReviewSort::IdAsc.order_by(),
            FEED_ORDER,
        ];
        for clause in clauses {
            assert!(
                clause.ends_with("r.id ASC") || clause.ends_with("r.id DESC"),
                "{clause}"
            );
        }
    }

    fn window(rows: &[u32], req: PageRequest) -> Page<u32> {
        req.fetch(
            || Ok(rows.len() as u64),
            |limit, offset| {
                Ok(rows
                    .iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .copied()
                    .collect())
            },
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn pages_reconstruct_the_full_set(len in 0usize..60, size in 1i64..12) {
            let rows: Vec<u32> = (0..len as u32).collect();
            let mut seen = Vec::new();
            let mut page = 1;
            loop {
                let p = window(&rows, PageRequest::new(page, size).unwrap());
                prop_assert_eq!(p.total, len as u64);
                if p.items.is_empty() {
                    break;
                }
                prop_assert!(p.items.len() as i64 <= size);
                seen.extend(p.items);
                page += 1;
            }
            prop_assert_eq!(seen, rows);
        }
    }
}
