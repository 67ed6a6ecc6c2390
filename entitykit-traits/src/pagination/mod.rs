//! Paginated entity cache.
//!
//! Keeps a window of the full result set in the entity collection and
//! serves pages out of it. Three cache policies decide how a loaded batch
//! merges into the window; see [`CacheType`] and [`merge_loaded`].
//!
//! Pagination orders itself after filtering, sorting and CRUD tracking when
//! those traits are present, so its page selectors slice the visible list
//! and its window follows local additions and removals.

mod cache;
mod effects;
mod model;
mod navigation;

pub use cache::{merge_loaded, page_entities, resync_window, show_all};
pub use model::{CacheType, PageCache, PageInfo, PagedRequest, PaginationConfig, PaginationState};
pub use navigation::{resolve_navigation, NavigationError, NavigationTarget};

use crate::entities::collection;
use crate::filter::FilterConfig;
use crate::keys::{
    ADD_ENTITIES, CLEAR_PAGES_CACHE, CRUD, ENTITIES, ENTITIES_FIELD, FILTER, IS_PAGE_IN_CACHE,
    LOAD_FIRST_PAGE, LOAD_LAST_PAGE, LOAD_NEXT_PAGE, LOAD_PAGE,
    LOAD_PAGE_FAIL, LOAD_PAGE_SUCCESS, LOAD_PREVIOUS_PAGE, PAGINATION, PAGINATION_FIELD,
    REMOVE_ALL_ENTITIES, REMOVE_ENTITIES, RESET_ENTITIES_SORT, SELECT_ALL, SELECT_PAGED_REQUEST,
    SELECT_PAGE_ENTITIES, SELECT_PAGE_INFO, SELECT_PAGINATION, SET_REQUEST_PAGE, SORT,
    SORT_ENTITIES, STORE_ENTITIES_FILTER, UPSERT_ENTITIES,
};
use crate::payload::{decode, to_entities, LoadedPayload};
use crate::sort::SortConfig;
use effects::PaginationEffect;
use entitykit_compose::{
    derive_keys, effect_constructor, selector, selector_with, Action, ActionSet, ComposeResult,
    CompositionContext, Effect, EffectConstructor, Erased, FeatureState, FeatureTrait, Reducer,
    ReducerFragment, SelectFn, SelectWithFn, SelectorSet,
};
use entitykit_types::{Entity, EntityCollection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Payload of `loadPage` and `loadFirstPage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadPagePayload {
    #[serde(default)]
    pub index: usize,
    /// Fetch even if the page is cached.
    #[serde(default)]
    pub force_load: bool,
}

/// Payload of `setRequestPage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageIndexPayload {
    pub index: usize,
}

/// The pagination trait.
#[derive(Debug, Clone, Default)]
pub struct PaginationTrait {
    config: PaginationConfig,
}

impl PaginationTrait {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }
}

fn read(state: &FeatureState, config: &PaginationConfig) -> PaginationState {
    state
        .get::<PaginationState>(PAGINATION_FIELD)
        .cloned()
        .unwrap_or_else(|| PaginationState::from_config(config))
}

fn with_pagination(state: FeatureState, f: impl FnOnce(&mut PaginationState)) -> FeatureState {
    state.update::<PaginationState, _>(PAGINATION_FIELD, f)
}

impl FeatureTrait for PaginationTrait {
    fn key(&self) -> &str {
        PAGINATION
    }

    fn depends_on(&self) -> Vec<String> {
        vec![ENTITIES.into()]
    }

    fn runs_after(&self) -> Vec<String> {
        vec![FILTER.into(), SORT.into(), CRUD.into()]
    }

    fn config(&self) -> Option<Erased> {
        Some(Erased::new(self.config.clone()))
    }

    fn validate(&self) -> ComposeResult<()> {
        self.config.validate()
    }

    fn actions(&self, _ctx: &CompositionContext) -> ComposeResult<ActionSet> {
        Ok(ActionSet::new()
            .action(LOAD_PAGE)
            .action(LOAD_PAGE_SUCCESS)
            .action(LOAD_PAGE_FAIL)
            .action(LOAD_NEXT_PAGE)
            .action(LOAD_PREVIOUS_PAGE)
            .action(LOAD_FIRST_PAGE)
            .action(LOAD_LAST_PAGE)
            .action(SET_REQUEST_PAGE)
            .action(CLEAR_PAGES_CACHE))
    }

    fn selectors(&self, ctx: &CompositionContext) -> ComposeResult<SelectorSet> {
        let visible = ctx
            .all_selectors()
            .require::<SelectFn<Vec<Entity>>>(SELECT_ALL, PAGINATION)?;
        let config = self.config.clone();

        let c = config.clone();
        let select_pagination: SelectFn<PaginationState> =
            selector(move |s: &FeatureState| read(s, &c));
        let c = config.clone();
        let select_page_entities: SelectWithFn<Option<usize>, Vec<Entity>> =
            selector_with(move |s: &FeatureState, page: Option<usize>| {
                let pagination = read(s, &c);
                let page = page.unwrap_or(pagination.current_page);
                page_entities(&visible(s), &pagination, page)
            });
        let c = config.clone();
        let select_page_info: SelectFn<PageInfo> =
            selector(move |s: &FeatureState| read(s, &c).page_info());
        let c = config.clone();
        let is_page_in_cache: SelectWithFn<usize, bool> =
            selector_with(move |s: &FeatureState, page: usize| read(s, &c).is_page_in_cache(page));
        let select_paged_request: SelectFn<PagedRequest> =
            selector(move |s: &FeatureState| read(s, &config).paged_request());

        Ok(SelectorSet::new()
            .with(SELECT_PAGINATION, select_pagination)
            .with(SELECT_PAGE_ENTITIES, select_page_entities)
            .with(SELECT_PAGE_INFO, select_page_info)
            .with(IS_PAGE_IN_CACHE, is_page_in_cache)
            .with(SELECT_PAGED_REQUEST, select_paged_request))
    }

    fn initial_state(&self, _ctx: &CompositionContext) -> ComposeResult<FeatureState> {
        Ok(FeatureState::new().with(PAGINATION_FIELD, PaginationState::from_config(&self.config)))
    }

    fn reducer(&self, ctx: &CompositionContext) -> ComposeResult<Option<Reducer>> {
        let visible = ctx
            .all_selectors()
            .require::<SelectFn<Vec<Entity>>>(SELECT_ALL, PAGINATION)?;
        let local_filter = ctx
            .config::<FilterConfig>(FILTER)
            .is_some_and(|c| c.is_local());
        let local_sort = ctx.config::<SortConfig>(SORT).is_some_and(|c| !c.remote);
        let loaded = derive_keys(ENTITIES).success;

        let merge_visible = visible.clone();
        let filter_visible = visible.clone();
        let resync = move |state: FeatureState, _: &Action| {
            let Some(mut pagination) = state.get::<PaginationState>(PAGINATION_FIELD).cloned()
            else {
                return state;
            };
            let collection_len = collection(&state).len();
            let visible_len = if pagination.cache_type() == CacheType::Full {
                visible(&state).len()
            } else {
                collection_len
            };
            resync_window(&mut pagination, collection_len, visible_len);
            state.with(PAGINATION_FIELD, pagination)
        };

        let mut fragment = ReducerFragment::new()
            .on(LOAD_PAGE, |state, action| match decode::<LoadPagePayload>(action) {
                Some(payload) => with_pagination(state, |p| {
                    p.current_page = payload.index;
                    p.request_page = payload.index;
                }),
                None => state,
            })
            .on(SET_REQUEST_PAGE, |state, action| match decode::<PageIndexPayload>(action) {
                Some(payload) => with_pagination(state, |p| p.request_page = payload.index),
                None => state,
            })
            .on(CLEAR_PAGES_CACHE, |state, _| {
                let state = with_pagination(state, PaginationState::clear);
                state.update::<EntityCollection, _>(ENTITIES_FIELD, |c| {
                    c.remove_all();
                })
            })
            .on(loaded, move |state, action| {
                let Some(payload) = decode::<LoadedPayload>(action) else {
                    return state;
                };
                let Some(mut pagination) = state.get::<PaginationState>(PAGINATION_FIELD).cloned()
                else {
                    return state;
                };
                let mut entities = collection(&state);
                merge_loaded(
                    &mut entities,
                    &mut pagination,
                    to_entities(payload.entities),
                    payload.total,
                );
                let state = state.with(ENTITIES_FIELD, entities);
                if pagination.cache_type() == CacheType::Full {
                    show_all(&mut pagination, merge_visible(&state).len());
                }
                state.with(PAGINATION_FIELD, pagination)
            });

        for kind in [
            ADD_ENTITIES,
            UPSERT_ENTITIES,
            REMOVE_ENTITIES,
            REMOVE_ALL_ENTITIES,
        ] {
            fragment = fragment.on(kind, resync.clone());
        }

        fragment = fragment.on_if(local_filter, STORE_ENTITIES_FILTER, move |state, _| {
            let count = filter_visible(&state).len();
            with_pagination(state, |p| {
                show_all(p, count);
                p.current_page = 0;
                p.request_page = 0;
            })
        });
        for kind in [SORT_ENTITIES, RESET_ENTITIES_SORT] {
            fragment = fragment.on_if(local_sort, kind, |state, _| {
                with_pagination(state, |p| {
                    p.current_page = 0;
                    p.request_page = 0;
                })
            });
        }

        Ok(Some(fragment.into_reducer()))
    }

    fn effects(&self, _ctx: &CompositionContext) -> ComposeResult<Vec<EffectConstructor>> {
        Ok(vec![effect_constructor(|deps| {
            let keys = derive_keys(ENTITIES);
            let actions = deps.actions;
            Ok(Arc::new(PaginationEffect {
                load_page: actions.require_creator(LOAD_PAGE, PAGINATION)?,
                load_page_success: actions.require_creator(LOAD_PAGE_SUCCESS, PAGINATION)?,
                load_page_fail: actions.require_creator(LOAD_PAGE_FAIL, PAGINATION)?,
                set_request_page: actions.require_creator(SET_REQUEST_PAGE, PAGINATION)?,
                load_entities: actions.require_creator(&keys.call, PAGINATION)?,
                load_entities_success: keys.success,
                load_entities_fail: keys.fail,
            }) as Arc<dyn Effect>)
        })])
    }
}
