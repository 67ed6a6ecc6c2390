//! The page navigation effect.
//!
//! Runs serialized so a preload chain (page ready, record the next page,
//! fetch it) completes in order before the next navigation is handled.

use super::model::{CacheType, PaginationState};
use super::navigation::{resolve_navigation, NavigationError, NavigationTarget};
use super::LoadPagePayload;
use crate::keys::{
    LOAD_FIRST_PAGE, LOAD_LAST_PAGE, LOAD_NEXT_PAGE, LOAD_PAGE, LOAD_PAGE_SUCCESS,
    LOAD_PREVIOUS_PAGE, PAGINATION_FIELD,
};
use crate::payload::{decode, FailPayload};
use async_trait::async_trait;
use entitykit_compose::{Action, ActionCreator, Effect, SchedulePolicy, StateReader};
use serde_json::json;
use tracing::debug;

pub(super) struct PaginationEffect {
    pub(super) load_page: ActionCreator,
    pub(super) load_page_success: ActionCreator,
    pub(super) load_page_fail: ActionCreator,
    pub(super) set_request_page: ActionCreator,
    pub(super) load_entities: ActionCreator,
    pub(super) load_entities_success: String,
    pub(super) load_entities_fail: String,
}

impl PaginationEffect {
    fn navigate(&self, pagination: &PaginationState, target: NavigationTarget) -> Action {
        match resolve_navigation(pagination, target) {
            Ok(index) => self.load_page.create(json!({ "index": index })),
            Err(e) => {
                debug!("Page navigation {:?} failed: {}", target, e);
                self.load_page_fail.create(json!({ "error": e.to_string() }))
            }
        }
    }

    fn on_load_page(&self, pagination: &PaginationState, action: &Action) -> Vec<Action> {
        let Some(payload) = decode::<LoadPagePayload>(action) else {
            return Vec::new();
        };
        if pagination.page_range(payload.index).is_none() {
            let e = NavigationError::OutOfRange(payload.index);
            debug!("Page load failed: {}", e);
            return vec![self.load_page_fail.create(json!({ "error": e.to_string() }))];
        }
        if !payload.force_load && pagination.is_page_in_cache(payload.index) {
            debug!("Page {} served from cache", payload.index);
            return vec![self.load_page_success.empty()];
        }
        vec![self.load_entities.empty()]
    }

    /// Keeps the window one page ahead of the current page.
    fn preload(&self, pagination: &PaginationState) -> Vec<Action> {
        let Some(next) = pagination.current_page.checked_add(1) else {
            return Vec::new();
        };
        if pagination.cache_type() == CacheType::Full
            || !pagination.page_info().has_next
            || pagination.is_page_in_cache(next)
        {
            return Vec::new();
        }
        debug!("Preloading page {}", next);
        vec![
            self.set_request_page.create(json!({ "index": next })),
            self.load_entities.empty(),
        ]
    }
}

#[async_trait]
impl Effect for PaginationEffect {
    fn name(&self) -> &str {
        "pagination"
    }

    fn policy(&self) -> SchedulePolicy {
        SchedulePolicy::SerializeFifo
    }

    fn accepts(&self, action: &Action) -> bool {
        [
            LOAD_PAGE,
            LOAD_PAGE_SUCCESS,
            LOAD_FIRST_PAGE,
            LOAD_PREVIOUS_PAGE,
            LOAD_NEXT_PAGE,
            LOAD_LAST_PAGE,
            self.load_entities_success.as_str(),
            self.load_entities_fail.as_str(),
        ]
        .contains(&action.kind.as_str())
    }

    async fn run(&self, action: Action, state: StateReader) -> Vec<Action> {
        let Some(pagination) = state().get::<PaginationState>(PAGINATION_FIELD).cloned() else {
            return Vec::new();
        };
        match action.kind.as_str() {
            LOAD_FIRST_PAGE => {
                let force_load = decode::<LoadPagePayload>(&action).is_some_and(|p| p.force_load);
                vec![self
                    .load_page
                    .create(json!({ "index": 0, "forceLoad": force_load }))]
            }
            LOAD_PREVIOUS_PAGE => vec![self.navigate(&pagination, NavigationTarget::Previous)],
            LOAD_NEXT_PAGE => vec![self.navigate(&pagination, NavigationTarget::Next)],
            LOAD_LAST_PAGE => vec![self.navigate(&pagination, NavigationTarget::Last)],
            LOAD_PAGE => self.on_load_page(&pagination, &action),
            LOAD_PAGE_SUCCESS => self.preload(&pagination),
            // A landed preload only widens the window; the page the user is
            // on was already reported ready.
            kind if kind == self.load_entities_success => {
                if pagination.is_preload() {
                    Vec::new()
                } else {
                    vec![self.load_page_success.empty()]
                }
            }
            kind if kind == self.load_entities_fail => {
                if pagination.is_preload() {
                    return Vec::new();
                }
                let error = decode::<FailPayload>(&action).and_then(|p| p.error);
                vec![self.load_page_fail.create(json!({ "error": error }))]
            }
            _ => Vec::new(),
        }
    }
}
