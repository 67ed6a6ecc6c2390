//! Property-based tests for the page cache and change-log compaction.

use entitykit_traits::compact;
use entitykit_traits::pagination::merge_loaded;
use entitykit_traits::{CacheType, PaginationConfig, PaginationState};
use entitykit_types::{Change, ChangeType, Entity, EntityCollection, EntityId};
use proptest::prelude::*;

// =============================================================================
// HELPERS
// =============================================================================

fn entities(range: std::ops::Range<usize>) -> Vec<Entity> {
    range
        .map(|i| Entity::with_fields(EntityId::from(i as u64), serde_json::Map::new()))
        .collect()
}

fn arb_change_type() -> impl Strategy<Value = ChangeType> {
    prop_oneof![
        Just(ChangeType::Created),
        Just(ChangeType::Updated),
        Just(ChangeType::Deleted),
    ]
}

fn arb_log() -> impl Strategy<Value = Vec<Change>> {
    prop::collection::vec((0u64..6, arb_change_type()), 0..40).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, change_type)| Change::new(id, change_type))
            .collect()
    })
}

fn state(cache_type: CacheType, page_size: usize, pages_to_cache: usize) -> PaginationState {
    PaginationState::from_config(
        &PaginationConfig::new(cache_type, page_size).with_pages_to_cache(pages_to_cache),
    )
}

// =============================================================================
// COMPACTION
// =============================================================================

mod compaction_properties {
    use super::*;

    proptest! {
        #[test]
        fn compaction_is_idempotent(log in arb_log()) {
            let once = compact(&log);
            prop_assert_eq!(compact(&once), once);
        }

        #[test]
        fn compaction_keeps_at_most_one_entry_per_id(log in arb_log()) {
            let compacted = compact(&log);
            let mut ids: Vec<&EntityId> = compacted.iter().map(|c| &c.id).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), compacted.len());
        }

        #[test]
        fn created_then_deleted_leaves_nothing(
            before in arb_log(),
            updates in 0usize..4,
        ) {
            // Id 99 never appears in the generated prefix.
            let mut log = before.clone();
            log.push(Change::created(99u64));
            log.extend((0..updates).map(|_| Change::updated(99u64)));
            log.push(Change::deleted(99u64));

            let compacted = compact(&log);
            prop_assert!(compacted.iter().all(|c| c.id != EntityId::from(99u64)));
            prop_assert_eq!(compacted, compact(&before));
        }
    }
}

// =============================================================================
// PAGE CACHE
// =============================================================================

mod cache_properties {
    use super::*;

    proptest! {
        #[test]
        fn full_load_window_matches_loaded_count(
            count in 0usize..200,
            page_size in 1usize..50,
        ) {
            let mut collection = EntityCollection::new();
            let mut pagination = state(CacheType::Full, page_size, 3);
            merge_loaded(&mut collection, &mut pagination, entities(0..count), None);

            prop_assert_eq!(pagination.cache.end - pagination.cache.start, count);
            prop_assert_eq!(pagination.total, Some(count));
            prop_assert_eq!(collection.len(), count);
        }

        #[test]
        fn page_in_cache_iff_all_indices_cached(
            start in 0usize..100,
            len in 0usize..100,
            total in 0usize..250,
            page_size in 1usize..30,
            page in 0usize..20,
        ) {
            let mut pagination = state(CacheType::Partial, page_size, 3);
            pagination.cache.start = start;
            pagination.cache.end = start + len;
            pagination.total = Some(total);

            let indices: Vec<usize> =
                (page * page_size..((page + 1) * page_size).min(total)).collect();
            let expected = !indices.is_empty()
                && indices.iter().all(|i| (start..start + len).contains(i));
            prop_assert_eq!(pagination.is_page_in_cache(page), expected);
        }

        #[test]
        fn partial_preload_extends_window_end(
            first in 1usize..4,
            loaded in 0usize..60,
        ) {
            let page_size = 20;
            let mut collection = EntityCollection::new();
            let mut pagination = state(CacheType::Partial, page_size, 3);
            merge_loaded(&mut collection, &mut pagination, entities(0..first * page_size), Some(500));
            let before = pagination.cache;

            pagination.current_page = first - 1;
            pagination.request_page = first;
            let next = first * page_size;
            merge_loaded(&mut collection, &mut pagination, entities(next..next + loaded), Some(500));

            prop_assert_eq!(pagination.cache.start, before.start);
            prop_assert_eq!(pagination.cache.end, before.end + loaded);
            prop_assert_eq!(collection.len(), pagination.cache.len());
        }

        #[test]
        fn grow_never_drops_loaded_entities(
            pages in prop::collection::vec(0usize..10, 1..6),
        ) {
            let page_size = 10;
            let mut collection = EntityCollection::new();
            let mut pagination = state(CacheType::Grow, page_size, 3);
            let mut seen = std::collections::HashSet::new();
            for page in pages {
                pagination.current_page = page;
                pagination.request_page = page;
                let start = page * page_size;
                seen.extend(start..start + page_size);
                merge_loaded(&mut collection, &mut pagination, entities(start..start + page_size), Some(100));
                prop_assert_eq!(collection.len(), seen.len());
                prop_assert_eq!(pagination.cache.len(), seen.len());
            }
        }
    }
}

#[test]
fn scenario_create_update_delete_create() {
    let log = vec![
        Change::created(1u64),
        Change::updated(1u64),
        Change::deleted(1u64),
        Change::created(2u64),
    ];
    assert_eq!(compact(&log), vec![Change::created(2u64)]);
}
