use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Fills defaults and checks bounds.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, Error> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let mut errors = Vec::new();
        if page < 1 {
            errors.push(FieldError::new("page", "page must be a positive integer"));
        }
        if limit < 1 || limit > MAX_PAGE_LIMIT {
            errors.push(FieldError::new(
                "limit",
                format!("limit must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }
        if errors.is_empty() {
            Ok(Self { page, limit })
        } else {
            Err(Error::Validation(errors))
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, req: PageRequest) -> Self {
        let limit = u64::from(req.limit.max(1));
        Self {
            docs,
            total_docs,
            page: req.page,
            limit: req.limit,
            total_pages: total_docs.div_ceil(limit),
        }
    }

    /// Slices an already filtered, already ordered list.
    pub fn from_vec(items: Vec<T>, req: PageRequest) -> Self {
        let total = items.len() as u64;
        let docs = items
            .into_iter()
            .skip(req.offset() as usize)
            .take(req.limit as usize)
            .collect();
        Self::new(docs, total, req)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}
