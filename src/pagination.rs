use serde::Serialize;

// ============================================================================
// Pagination - page/limit windows over list queries
// ============================================================================

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Zero or missing values fall back to the defaults; limit is capped.
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Cut this page out of an already sorted result set
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items.into_iter().skip(self.offset()).take(self.limit as usize).collect();
        Page {
            items,
            total,
            request: *self,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRequest>,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matches across all pages
    pub total: usize,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn links(&self) -> PageLinks {
        let PageRequest { page, limit } = self.request;
        let next = (self.request.offset() + self.items.len() < self.total)
            .then_some(PageRequest { page: page + 1, limit });
        let prev = (page > 1).then_some(PageRequest { page: page - 1, limit });
        PageLinks { next, prev }
    }
}
