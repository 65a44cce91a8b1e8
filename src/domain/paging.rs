use std::num::NonZeroU32;

use super::error::DomainError;

/// Validated page window: `count` items per page, 1-based `page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub count: NonZeroU32,
    pub page: NonZeroU32,
}

impl PageRequest {
    pub fn parse(count: &str, page: &str) -> Result<Self, DomainError> {
        Ok(Self {
            count: parse_positive("count", count)?,
            page: parse_positive("page", page)?,
        })
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        let page = usize::try_from(self.page.get() - 1).unwrap_or(usize::MAX);
        page.saturating_mul(self.limit())
    }

    pub fn limit(&self) -> usize {
        usize::try_from(self.count.get()).unwrap_or(usize::MAX)
    }
}

/// Parse a path segment as a positive integer.
pub fn parse_positive(name: &'static str, raw: &str) -> Result<NonZeroU32, DomainError> {
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::validation(format!("`{name}` must be a positive integer")))?;
    NonZeroU32::new(value)
        .ok_or_else(|| DomainError::validation(format!("`{name}` must be greater than zero")))
}
