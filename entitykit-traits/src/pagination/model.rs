//! Pagination configuration, state and derived page info.

use entitykit_compose::{ComposeError, ComposeResult};
use serde::{Deserialize, Serialize};

use crate::keys::PAGINATION;

/// How the cached window relates to the backing collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// Everything is loaded at once; pages are slices of the whole list.
    #[default]
    Full,
    /// A sliding window of `pagesToCache` pages, fetched from the backend.
    Partial,
    /// Pages accumulate as they are loaded (infinite scroll).
    Grow,
}

fn default_page_size() -> usize {
    20
}

fn default_pages_to_cache() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationConfig {
    #[serde(default)]
    pub cache_type: CacheType,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub current_page: usize,
    #[serde(default = "default_pages_to_cache")]
    pub pages_to_cache: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::default(),
            page_size: default_page_size(),
            current_page: 0,
            pages_to_cache: default_pages_to_cache(),
        }
    }
}

impl PaginationConfig {
    pub fn new(cache_type: CacheType, page_size: usize) -> Self {
        Self {
            cache_type,
            page_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pages_to_cache(mut self, pages: usize) -> Self {
        self.pages_to_cache = pages;
        self
    }

    pub fn validate(&self) -> ComposeResult<()> {
        let reason = if self.page_size == 0 {
            "pageSize must be greater than 0"
        } else if self.pages_to_cache == 0 {
            "pagesToCache must be at least 1"
        } else {
            return Ok(());
        };
        Err(ComposeError::InvalidConfig {
            trait_key: PAGINATION.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// The cached window, as absolute indices into the full result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCache {
    #[serde(rename = "type")]
    pub cache_type: CacheType,
    pub start: usize,
    pub end: usize,
}

impl PageCache {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pagination slice of the feature state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub current_page: usize,
    /// Page the next fetch is for. Equals `current_page` except while a
    /// preload is pending.
    pub request_page: usize,
    pub page_size: usize,
    /// Size of the full result set; `None` until the first load.
    pub total: Option<usize>,
    pub pages_to_cache: usize,
    pub cache: PageCache,
}

impl PaginationState {
    pub fn from_config(config: &PaginationConfig) -> Self {
        Self {
            current_page: config.current_page,
            request_page: config.current_page,
            page_size: config.page_size,
            total: None,
            pages_to_cache: config.pages_to_cache,
            cache: PageCache {
                cache_type: config.cache_type,
                start: 0,
                end: 0,
            },
        }
    }

    pub fn cache_type(&self) -> CacheType {
        self.cache.cache_type
    }

    /// Whether the pending load extends the window forward rather than
    /// replacing it.
    ///
    /// This is a heuristic: a direct jump to `current_page + 1` that was not
    /// issued by the preload step is classified the same way.
    pub fn is_preload(&self) -> bool {
        self.current_page.checked_add(1) == Some(self.request_page)
    }

    /// `ceil(total / page_size)`, or `None` while the total is unknown.
    pub fn pages_count(&self) -> Option<usize> {
        self.total.map(|total| total.div_ceil(self.page_size.max(1)))
    }

    pub fn page_info(&self) -> PageInfo {
        let pages_count = self.pages_count();
        PageInfo {
            page_index: self.current_page,
            page_size: self.page_size,
            total: self.total,
            pages_count,
            has_previous: self.current_page > 0,
            has_next: pages_count.is_none_or(|count| self.current_page.saturating_add(1) < count),
            cache_type: self.cache_type(),
        }
    }

    /// Absolute index range `[first, last)` of `page`, cut at the total.
    /// `None` when the page starts beyond the addressable indices.
    pub fn page_range(&self, page: usize) -> Option<(usize, usize)> {
        let first = page.checked_mul(self.page_size)?;
        let last = first.saturating_add(self.page_size);
        Some(match self.total {
            Some(total) => (first, last.min(total)),
            None => (first, last),
        })
    }

    /// True exactly when every index of `page` lies in the cached window.
    /// A page with no indices (past the total) is never cached.
    pub fn is_page_in_cache(&self, page: usize) -> bool {
        self.page_range(page).is_some_and(|(first, last)| {
            first < last && self.cache.start <= first && last <= self.cache.end
        })
    }

    /// The fetch window for `request_page` under the cache policy.
    pub fn paged_request(&self) -> PagedRequest {
        let page = self.request_page;
        match self.cache_type() {
            CacheType::Full => PagedRequest {
                page,
                start_index: 0,
                size: None,
            },
            CacheType::Partial => PagedRequest {
                page,
                start_index: page.saturating_mul(self.page_size),
                size: Some(self.page_size.saturating_mul(self.pages_to_cache)),
            },
            CacheType::Grow => PagedRequest {
                page,
                start_index: page.saturating_mul(self.page_size),
                size: Some(self.page_size),
            },
        }
    }

    /// Back to the first page with an empty window.
    pub fn clear(&mut self) {
        self.current_page = 0;
        self.request_page = 0;
        self.total = Some(0);
        self.cache.start = 0;
        self.cache.end = 0;
    }
}

/// Derived navigation info for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_index: usize,
    pub page_size: usize,
    pub total: Option<usize>,
    pub pages_count: Option<usize>,
    pub has_previous: bool,
    pub has_next: bool,
    pub cache_type: CacheType,
}

/// What a fetch should load: `size` entities from `start_index`, or
/// everything when `size` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedRequest {
    pub page: usize,
    pub start_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}
