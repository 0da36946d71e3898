use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
/// Upper bound on `limit` for every paged read.
pub const MAX_PAGE_SIZE: u64 = 100;
/// Largest offset the store can bind (a signed 64-bit integer).
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Query parameters `?limit=&offset=`.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// A resolved limit/offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

impl PageRequest {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
            offset: offset.unwrap_or(0).min(MAX_OFFSET),
        }
    }

    /// `offset + limit < total`
    pub fn has_more(&self, total: u64) -> bool {
        self.offset.saturating_add(self.limit) < total
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl From<PaginationParams> for PageRequest {
    fn from(p: PaginationParams) -> Self {
        Self::new(p.limit, p.offset)
    }
}
