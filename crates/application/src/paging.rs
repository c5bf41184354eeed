use serde::Serialize;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 100;

/// Normalized pagination input for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Builds a request from raw client input, clamping out-of-range values.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    /// One-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Row limit for SQL `LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a tenant-scoped listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Total matching rows across all pages.
    pub total: i64,
    /// One-based page number.
    pub page: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Assembles a page from query results and the originating request.
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let total_rows = u64::try_from(total.max(0)).unwrap_or(0);
        let total_pages = u32::try_from(total_rows.div_ceil(u64::from(request.per_page())))
            .unwrap_or(u32::MAX);

        Self {
            items,
            total,
            page: request.page(),
            per_page: request.per_page(),
            total_pages,
        }
    }

    /// Maps page items while keeping the pagination envelope.
    #[must_use]
    pub fn map<U>(self, convert: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(convert).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PageRequest};

    #[test]
    fn defaults_apply_when_input_is_absent() {
        let request = PageRequest::new(None, None);
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), 10);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn per_page_is_clamped() {
        let request = PageRequest::new(Some(0), Some(10_000));
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(Some(2), Some(10));
        let page = Page::new(vec![1, 2, 3], 23, &request);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
    }
}
