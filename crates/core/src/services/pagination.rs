//! Offset pagination shared by list, activity and review queries.

use serde::Serialize;

/// A clamped page request.
///
/// `page` is 1-based and never below 1; `limit` stays within
/// `1..=MAX_LIMIT`. Out-of-range input is clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    limit: u64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const MAX_LIMIT: u64 = 100;

    /// Build from raw query values.
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.map_or(1, |p| u64::try_from(p).unwrap_or(0).max(1));
        let limit = limit.map_or(Self::DEFAULT_LIMIT, |l| {
            u64::try_from(l).unwrap_or(0).clamp(1, Self::MAX_LIMIT)
        });
        Self { page, limit }
    }

    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Rows to skip: `(page - 1) * limit`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(pagination: Pagination, total: u64, items: Vec<T>) -> Self {
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            items,
        }
    }

    /// Convert every item, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            limit: self.limit,
            total: self.total,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_limit_is_clamped_to_max() {
        assert_eq!(Pagination::new(None, Some(1000)).limit(), 100);
    }

    #[test]
    fn test_page_zero_becomes_one() {
        assert_eq!(Pagination::new(Some(0), None).page(), 1);
        assert_eq!(Pagination::new(Some(-3), None).page(), 1);
    }

    #[test]
    fn test_limit_below_one_becomes_one() {
        assert_eq!(Pagination::new(None, Some(0)).limit(), 1);
        assert_eq!(Pagination::new(None, Some(-5)).limit(), 1);
    }

    #[test]
    fn test_offset() {
        let p = Pagination::new(Some(3), Some(20));
        assert_eq!(p.offset(), 40);
    }
}
