use infra::pagination::LimitOffset;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// 1-based page request as it arrives in a query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn window(&self) -> LimitOffset {
        LimitOffset::for_page(self.page(), self.limit())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let limit = request.limit();
        Self {
            data,
            pagination: PageInfo {
                page: request.page(),
                limit,
                total,
                total_pages: (total + limit - 1) / limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 10);
        assert_eq!(request.window().offset, 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest {
            page: Some(2),
            limit: Some(10),
        };
        let page = Paginated::new(vec![1, 2, 3], request, 23);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.page, 2);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: Paginated<u8> = Paginated::new(vec![], PageRequest::default(), 0);
        assert_eq!(page.pagination.total_pages, 0);
    }

    #[test]
    fn oversized_limit_is_capped() {
        let request = PageRequest {
            page: Some(1),
            limit: Some(10_000),
        };
        assert_eq!(request.limit(), MAX_PAGE_SIZE);
    }
}
