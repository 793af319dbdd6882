use serde::{Deserialize, Serialize};

/// `?page=` / `?limit=` query parameters shared by the paginated listings.
/// `limit` falls back to the configured page size when absent.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    pub limit: Option<i64>,
}

fn default_page() -> i64 {
    1
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: None,
        }
    }
}

impl PageQuery {
    pub fn limit_or(&self, default_limit: i64) -> i64 {
        let limit = self.limit.unwrap_or(default_limit);
        limit.max(1)
    }

    pub fn offset(&self, limit: i64) -> i64 {
        (self.page.max(1) - 1) * limit
    }
}

/// Paginated response envelope: total count plus links to the neighbouring
/// pages, in the shape clients already consume.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(path: &str, query: &PageQuery, limit: i64, count: i64, results: Vec<T>) -> Self {
        let page = query.page.max(1);
        let last_page = if count == 0 { 1 } else { (count + limit - 1) / limit };
        let next = (page < last_page).then(|| page_link(path, page + 1, limit));
        let previous = (page > 1).then(|| page_link(path, page - 1, limit));
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

fn page_link(path: &str, page: i64, limit: i64) -> String {
    format!("{path}?page={page}&limit={limit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: i64, limit: Option<i64>) -> PageQuery {
        PageQuery { page, limit }
    }

    #[test]
    fn limit_falls_back_to_default() {
        assert_eq!(query(1, None).limit_or(6), 6);
        assert_eq!(query(1, Some(20)).limit_or(6), 20);
        assert_eq!(query(1, Some(0)).limit_or(6), 1);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(query(1, None).offset(6), 0);
        assert_eq!(query(3, None).offset(6), 12);
        assert_eq!(query(0, None).offset(6), 0);
    }

    #[test]
    fn first_page_has_no_previous() {
        let page = Page::new("/api/users", &query(1, Some(2)), 2, 5, vec![1, 2]);
        assert_eq!(page.count, 5);
        assert!(page.previous.is_none());
        assert_eq!(page.next.as_deref(), Some("/api/users?page=2&limit=2"));
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = Page::new("/api/users", &query(2, Some(2)), 2, 5, vec![3, 4]);
        assert_eq!(page.previous.as_deref(), Some("/api/users?page=1&limit=2"));
        assert_eq!(page.next.as_deref(), Some("/api/users?page=3&limit=2"));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = Page::new("/api/users", &query(3, Some(2)), 2, 5, vec![5]);
        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("/api/users?page=2&limit=2"));
    }

    #[test]
    fn empty_listing_has_no_links() {
        let page: Page<i64> = Page::new("/api/users", &query(1, Some(6)), 6, 0, vec![]);
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
    }
}
