//! This modules defines the common functionality for paging lists of records.

use serde::{Deserialize, Serialize};

/// The number of items returned when the request does not specify a limit.
pub const DEFAULT_LIMIT: u64 = 100;

/// The largest number of items a single request may ask for.
pub const MAX_LIMIT: u64 = 1000;

/// The raw `skip` and `limit` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationQuery {
    /// How many records to skip, defaults to zero.
    pub skip: Option<u64>,
    /// How many records to return, defaults to [DEFAULT_LIMIT] and is capped at [MAX_LIMIT].
    pub limit: Option<u64>,
}

/// An offset and page size with defaults applied and the limit capped at [MAX_LIMIT].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// How many records to skip.
    pub skip: u64,
    /// How many records to return.
    pub limit: u64,
}

impl From<&PaginationQuery> for Pagination {
    fn from(query: &PaginationQuery) -> Self {
        Self::new(query.skip, query.limit)
    }
}

impl Pagination {
    pub fn new(skip: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
        }
    }

    /// The SQL `LIMIT` and `OFFSET` values, saturated to fit in an `i64`.
    pub fn as_sql_params(&self) -> (i64, i64) {
        (
            i64::try_from(self.limit).unwrap_or(i64::MAX),
            i64::try_from(self.skip).unwrap_or(i64::MAX),
        )
    }
}

/// One page of a list of records, along with the number of records across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The records on this page.
    pub items: Vec<T>,
    /// The number of records across all pages.
    pub total: u64,
    /// How many records were skipped before this page.
    pub skip: u64,
    /// The most records a page can hold.
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            skip: pagination.skip,
            limit: pagination.limit,
        }
    }
}
