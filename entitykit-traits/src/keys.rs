//! Names contributed by the built-in traits.
//!
//! Trait keys double as config namespaces. Action, selector, mutator and
//! state-field names are what hosts pass to [`Feature::action`] and
//! [`Feature::selector`].
//!
//! [`Feature::action`]: entitykit_compose::Feature::action
//! [`Feature::selector`]: entitykit_compose::Feature::selector

// Trait keys
pub const ENTITIES: &str = "entities";
pub const PAGINATION: &str = "pagination";
pub const FILTER: &str = "filter";
pub const SORT: &str = "sort";
pub const CRUD: &str = "crud";
pub const SINGLE_SELECTION: &str = "singleSelection";
pub const MULTI_SELECTION: &str = "multiSelection";
pub const LOAD_ENTITY: &str = "loadEntity";

// Entities. The load actions and status selectors come from
// `derive_keys("entities")`.
pub const ENTITIES_FIELD: &str = "entities";
pub const SELECT_ALL: &str = "selectAll";
pub const SELECT_IDS: &str = "selectIds";
pub const SELECT_ENTITY_MAP: &str = "selectEntityMap";
pub const SELECT_TOTAL: &str = "selectTotal";
pub const SELECT_BY_ID: &str = "selectById";
pub const SET_ENTITIES: &str = "setEntities";
pub const ADD_ENTITIES: &str = "addEntities";
pub const UPSERT_ENTITIES: &str = "upsertEntities";
pub const UPDATE_ENTITIES: &str = "updateEntities";
pub const REMOVE_ENTITIES: &str = "removeEntities";
pub const REMOVE_ALL_ENTITIES: &str = "removeAllEntities";

// Pagination
pub const PAGINATION_FIELD: &str = "pagination";
pub const LOAD_PAGE: &str = "loadPage";
pub const LOAD_PAGE_SUCCESS: &str = "loadPageSuccess";
pub const LOAD_PAGE_FAIL: &str = "loadPageFail";
pub const LOAD_NEXT_PAGE: &str = "loadNextPage";
pub const LOAD_PREVIOUS_PAGE: &str = "loadPreviousPage";
pub const LOAD_FIRST_PAGE: &str = "loadFirstPage";
pub const LOAD_LAST_PAGE: &str = "loadLastPage";
pub const SET_REQUEST_PAGE: &str = "setRequestPage";
pub const CLEAR_PAGES_CACHE: &str = "clearPagesCache";
pub const SELECT_PAGINATION: &str = "selectPagination";
pub const SELECT_PAGE_ENTITIES: &str = "selectPageEntities";
pub const SELECT_PAGE_INFO: &str = "selectPageInfo";
pub const IS_PAGE_IN_CACHE: &str = "isPageInCache";
pub const SELECT_PAGED_REQUEST: &str = "selectPagedRequest";

// Filter
pub const FILTERS_FIELD: &str = "filters";
pub const FILTER_ENTITIES: &str = "filterEntities";
pub const STORE_ENTITIES_FILTER: &str = "storeEntitiesFilter";
pub const RESET_ENTITIES_FILTER: &str = "resetEntitiesFilter";
pub const SELECT_ENTITIES_FILTER: &str = "selectEntitiesFilter";

// Sort
pub const SORT_FIELD: &str = "sort";
pub const SORT_ENTITIES: &str = "sortEntities";
pub const RESET_ENTITIES_SORT: &str = "resetEntitiesSort";
pub const SELECT_SORT: &str = "selectSort";

// CRUD
pub const CHANGES_FIELD: &str = "changes";
pub const CLEAR_ENTITIES_CHANGES: &str = "clearEntitiesChanges";
pub const SELECT_CHANGES: &str = "selectChanges";
pub const SELECT_ALL_CHANGES: &str = "selectAllChanges";
pub const SELECT_FILTERED_CHANGES: &str = "selectFilteredChanges";

// Single selection
pub const SELECTED_ID_FIELD: &str = "selectedId";
pub const SELECT_ENTITY: &str = "selectEntity";
pub const DESELECT_ENTITY: &str = "deselectEntity";
pub const TOGGLE_SELECT_ENTITY: &str = "toggleSelectEntity";
pub const SELECT_ENTITY_ID_SELECTED: &str = "selectEntityIdSelected";
pub const SELECT_ENTITY_SELECTED: &str = "selectEntitySelected";

// Multi selection
pub const SELECTED_IDS_FIELD: &str = "selectedIds";
pub const SELECT_ENTITIES: &str = "selectEntities";
pub const DESELECT_ENTITIES: &str = "deselectEntities";
pub const TOGGLE_SELECT_ENTITIES: &str = "toggleSelectEntities";
pub const TOGGLE_SELECT_ALL_ENTITIES: &str = "toggleSelectAllEntities";
pub const CLEAR_ENTITIES_SELECTION: &str = "clearEntitiesSelection";
pub const SELECT_IDS_SELECTED: &str = "selectIdsSelected";
pub const SELECT_ENTITIES_SELECTED_LIST: &str = "selectEntitiesSelectedList";
pub const SELECT_TOTAL_SELECTED: &str = "selectTotalSelected";
pub const IS_ALL_ENTITIES_SELECTED: &str = "isAllEntitiesSelected";

// Single-entity load
pub const ENTITY_CALLS_FIELD: &str = "entityCalls";
pub const LOAD_ENTITY_ACTION: &str = "loadEntity";
pub const LOAD_ENTITY_SUCCESS: &str = "loadEntitySuccess";
pub const LOAD_ENTITY_FAIL: &str = "loadEntityFail";
pub const SELECT_ENTITY_CALL_STATUS: &str = "selectEntityCallStatus";
pub const IS_ENTITY_LOADING: &str = "isEntityLoading";
