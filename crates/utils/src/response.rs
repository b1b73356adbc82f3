use serde::{Deserialize, Serialize};

/// Standard mutation/detail envelope returned by every non-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

/// Offset/limit parameters accepted by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Resolve to a sanitized (page, limit, offset) triple.
    pub fn resolve(&self, default_limit: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(default_limit)
            .clamp(1, Self::MAX_LIMIT);
        (page, limit, (page - 1) * limit)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// List envelope: `{data, meta: {total, page, limit, total_pages}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            data,
            meta: PageMeta::new(total, page, limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_rounds_total_pages_up() {
        let meta = PageMeta::new(41, 1, 20);
        assert_eq!(meta.total_pages, 3);
        let meta = PageMeta::new(40, 1, 20);
        assert_eq!(meta.total_pages, 2);
    }

    #[test]
    fn page_meta_empty_has_zero_pages() {
        let meta = PageMeta::new(0, 1, 20);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn page_query_clamps_limit_and_page() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        let (page, limit, offset) = q.resolve(PageQuery::DEFAULT_LIMIT);
        assert_eq!(page, 1);
        assert_eq!(limit, PageQuery::MAX_LIMIT);
        assert_eq!(offset, 0);
    }

    #[test]
    fn page_query_offset_math() {
        let q = PageQuery {
            page: Some(3),
            limit: Some(50),
        };
        let (_, _, offset) = q.resolve(PageQuery::DEFAULT_LIMIT);
        assert_eq!(offset, 100);
    }
}
