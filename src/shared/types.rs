use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
    pub errors: Option<Vec<String>>,
}

/// Pagination envelope returned by all list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Standard pagination query parameters for all list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_limit")]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    /// Calculate SQL OFFSET from page number
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// Page coerced to >= 1
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Limit coerced to >= 1 and capped at MAX_PAGE_SIZE
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, pagination: Option<Pagination>) -> Self {
        Self {
            success: true,
            data,
            message,
            pagination,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            pagination: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_total_pages_ceiling() {
        assert_eq!(Pagination::new(0, 1, 10).total_pages, 0);
        assert_eq!(Pagination::new(10, 1, 10).total_pages, 1);
        assert_eq!(Pagination::new(11, 1, 10).total_pages, 2);
        assert_eq!(Pagination::new(95, 2, 10).total_pages, 10);
    }

    #[test]
    fn test_pagination_query_offset() {
        let q = PaginationQuery { page: 2, limit: 10 };
        assert_eq!(q.offset(), 10);
        assert_eq!(q.limit(), 10);

        // Page 2 of 10 covers items 11..=20
        let q = PaginationQuery { page: 3, limit: 25 };
        assert_eq!(q.offset(), 50);
    }

    #[test]
    fn test_pagination_query_clamping() {
        let q = PaginationQuery { page: 0, limit: 0 };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 1);
        assert_eq!(q.offset(), 0);

        let q = PaginationQuery {
            page: -5,
            limit: 10_000,
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), MAX_PAGE_SIZE);
    }
}
