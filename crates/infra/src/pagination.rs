/// Row window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

impl Default for LimitOffset {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

impl LimitOffset {
    /// Window for a 1-based page number. Pages past the addressable range
    /// saturate to an offset no table reaches.
    pub fn for_page(page: i64, limit: i64) -> Self {
        Self {
            limit,
            offset: (page.max(1) - 1).saturating_mul(limit),
        }
    }
}
