//! Merging loaded batches into the cached window.
//!
//! After a load the collection holds exactly the window: for full and
//! partial caches `collection.len() == cache.end - cache.start`, and a grow
//! cache only ever appends.

use super::model::{CacheType, PaginationState};
use entitykit_types::{Entity, EntityCollection};

/// Merges a loaded batch according to the cache policy.
///
/// `total` is the server-reported size of the full result set; partial and
/// grow caches keep their previous total when it is missing.
pub fn merge_loaded(
    collection: &mut EntityCollection,
    pagination: &mut PaginationState,
    entities: Vec<Entity>,
    total: Option<usize>,
) {
    match pagination.cache_type() {
        CacheType::Full => {
            collection.set_all(entities);
            pagination.cache.start = 0;
            pagination.cache.end = collection.len();
            pagination.total = Some(collection.len());
        }
        CacheType::Partial if pagination.is_preload() => {
            collection.add_many(entities);
            pagination.cache.end = pagination.cache.start.saturating_add(collection.len());
            pagination.total = total.or(pagination.total);
        }
        CacheType::Partial => {
            collection.set_all(entities);
            pagination.cache.start = pagination.current_page.saturating_mul(pagination.page_size);
            pagination.cache.end = pagination.cache.start.saturating_add(collection.len());
            pagination.total = total.or(pagination.total);
        }
        CacheType::Grow => {
            collection.add_many(entities);
            pagination.cache.end = pagination.cache.start.saturating_add(collection.len());
            pagination.total = total.or(pagination.total);
        }
    }
}

/// Realigns the window after entities were added or removed locally.
///
/// A full cache shows every visible entity, so its window and total are the
/// visible count. Partial and grow windows move their end with the
/// collection and shift the total by the same amount.
pub fn resync_window(pagination: &mut PaginationState, collection_len: usize, visible_len: usize) {
    match pagination.cache_type() {
        CacheType::Full => show_all(pagination, visible_len),
        CacheType::Partial | CacheType::Grow => {
            let previous = pagination.cache.len();
            pagination.cache.end = pagination.cache.start.saturating_add(collection_len);
            pagination.total = pagination.total.map(|total| {
                if collection_len >= previous {
                    total.saturating_add(collection_len - previous)
                } else {
                    total.saturating_sub(previous - collection_len)
                }
            });
        }
    }
}

/// Window `[0, visible)` with `total = visible`. Used after a full load and
/// after a locally evaluated filter changes what is visible.
pub fn show_all(pagination: &mut PaginationState, visible: usize) {
    pagination.cache.start = 0;
    pagination.cache.end = visible;
    pagination.total = Some(visible);
}

/// The entities of `page`, sliced out of the visible list.
///
/// `visible` is indexed relative to `cache.start`. A page outside the window
/// is empty; a page running past the window end is cut there. A grow cache
/// is scrolled rather than paged, so it yields everything loaded up to the
/// end of `page`.
pub fn page_entities(visible: &[Entity], pagination: &PaginationState, page: usize) -> Vec<Entity> {
    if pagination.cache_type() == CacheType::Grow {
        let end = page
            .saturating_add(1)
            .saturating_mul(pagination.page_size)
            .min(visible.len());
        return visible[..end].to_vec();
    }
    let Some(offset) = page
        .checked_mul(pagination.page_size)
        .and_then(|first| first.checked_sub(pagination.cache.start))
    else {
        return Vec::new();
    };
    let end = offset
        .saturating_add(pagination.page_size)
        .min(pagination.cache.len())
        .min(visible.len());
    if offset >= end {
        return Vec::new();
    }
    visible[offset..end].to_vec()
}
