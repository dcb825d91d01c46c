//! Page-number pagination over search results.
//!
//! Stores page with offset and limit; [`PaginationParams`] translates a 1-indexed page number
//! into that window and wraps what comes back into a [`Page`] with neighbour links.
//!
//! ```ignore
//! let params = PaginationParams::new(2, 20);
//! let query = ComplexQuery::builder().query(Filter::matches("message", "dog")).paginate(&params).build();
//!
//! let page = repository.execute_search(&query).await?.into_page(&params);
//! if let Some(next) = page.next_page {
//!     // fetch PaginationParams::new(next, 20)
//! }
//! ```

use serde::{Deserialize, Serialize};

/// One page of a larger result set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matching items across all pages.
    pub total: usize,
    /// The 1-indexed number of this page.
    pub page: usize,
    pub next_page: Option<usize>,
    pub previous_page: Option<usize>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transforms the items, keeping the navigation links.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }
}

/// A 1-indexed page number and page size. Page `0` is read as the first page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

impl PaginationParams {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    /// Number of items preceding this page.
    pub fn offset(&self) -> usize {
        self.number().saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }

    /// The parameters of the following page.
    pub fn next(&self) -> Self {
        Self::new(self.number() + 1, self.per_page)
    }

    /// Wraps the items of this page, already windowed by the store, given the total match count.
    pub fn page_of<T>(&self, items: Vec<T>, total: usize) -> Page<T> {
        let page = self.number();
        let seen = self.offset().saturating_add(items.len()).min(total);

        Page {
            items,
            total,
            page,
            next_page: (seen < total).then_some(page + 1),
            previous_page: (page > 1).then(|| page - 1),
        }
    }

    /// Windows a complete list of items down to this page.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let window = items
            .into_iter()
            .skip(self.offset())
            .take(self.per_page)
            .collect();

        self.page_of(window, total)
    }

    fn number(&self) -> usize {
        self.page.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_windows_and_links_neighbours() {
        let page = PaginationParams::new(2, 10).paginate((1..=25).collect::<Vec<_>>());

        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.next_page, Some(3));
        assert_eq!(page.previous_page, Some(1));
    }

    #[test]
    fn last_page_has_no_next_page() {
        let page = PaginationParams::new(3, 10).page_of(vec!['x'; 5], 25);

        assert_eq!(page.next_page, None);
        assert_eq!(page.previous_page, Some(2));
    }

    #[test]
    fn page_past_the_end_is_empty_but_keeps_the_total() {
        let page = PaginationParams::new(4, 10).paginate(vec![1, 2, 3]);

        assert!(page.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn page_zero_is_the_first_page() {
        let params = PaginationParams::new(0, 10);

        assert_eq!(params.offset(), 0);
        assert_eq!(params.next(), PaginationParams::new(2, 10));
        assert_eq!(params.paginate(vec![1]).previous_page, None);
    }
}
