//! Page metadata shared by list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One page of results plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo<T> {
    pub list: Vec<T>,
    /// Number of records matching the filter, across all pages
    pub total: u64,
    /// 1-based page number
    pub page_num: u64,
    pub page_size: u64,
    /// `ceil(total / page_size)`
    pub pages: u64,
}

impl<T> PageInfo<T> {
    pub fn new(list: Vec<T>, total: u64, page_num: u64, page_size: u64) -> Self {
        Self {
            list,
            total,
            page_num,
            page_size,
            pages: page_count(total, page_size),
        }
    }

    /// Convert the listed items, keeping the metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PageInfo<U> {
        PageInfo {
            list: self.list.into_iter().map(f).collect(),
            total: self.total,
            page_num: self.page_num,
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

pub fn page_count(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// Rows to skip for a 1-based `page_num`.
pub fn page_offset(page_num: u64, page_size: u64) -> u64 {
    page_num.saturating_sub(1).saturating_mul(page_size)
}
