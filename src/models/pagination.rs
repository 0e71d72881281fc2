use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw `page`/`page_size` query parameters. Values that are missing or do
/// not parse fall back to the defaults rather than failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageQuery {
    pub fn resolve(&self) -> Page {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);
        let page_size = self
            .page_size
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Page { page, page_size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// Collection envelope shared by every list endpoint
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: Page) -> Self {
        let size = page.page_size as i64;
        Self {
            items,
            total_count,
            page: page.page,
            page_size: page.page_size,
            total_pages: (total_count + size - 1) / size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(String::from),
            page_size: page_size.map(String::from),
        }
    }

    #[test]
    fn missing_values_use_defaults() {
        assert_eq!(query(None, None).resolve(), Page { page: 1, page_size: 10 });
    }

    #[test]
    fn garbage_values_use_defaults() {
        assert_eq!(query(Some("abc"), Some("-3")).resolve(), Page { page: 1, page_size: 10 });
    }

    #[test]
    fn values_are_clamped() {
        assert_eq!(query(Some("0"), Some("1000")).resolve(), Page { page: 1, page_size: 100 });
        assert_eq!(query(Some("3"), Some("0")).resolve(), Page { page: 3, page_size: 1 });
    }

    #[test]
    fn offset_skips_previous_pages() {
        let page = Page { page: 3, page_size: 5 };
        assert_eq!(page.offset(), 10);
        assert_eq!(page.limit(), 5);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page { page: 1, page_size: 5 };
        assert_eq!(Paginated::new(vec![0; 5], 11, page).total_pages, 3);
        assert_eq!(Paginated::new(vec![0; 5], 10, page).total_pages, 2);
        assert_eq!(Paginated::<i32>::new(vec![], 0, page).total_pages, 0);
    }
}
