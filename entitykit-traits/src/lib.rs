//! Built-in feature traits for entitykit.
//!
//! Each trait here is a [`FeatureTrait`](entitykit_compose::FeatureTrait)
//! ready to pass to [`compose`](entitykit_compose::compose):
//!
//! - [`EntitiesTrait`]: the entity collection and the `loadEntities` call
//! - [`PaginationTrait`]: a page cache with full, partial and grow policies
//! - [`FilterTrait`] and [`SortTrait`]: local or remote criteria
//! - [`CrudTrait`]: local mutations with a compactable change log
//! - [`SingleSelectionTrait`] and [`MultiSelectionTrait`]
//! - [`LoadEntityTrait`]: single-entity loads with per-ID status
//! - [`CallStatusTrait`]: status bookkeeping for any named call
//!
//! [`FeatureConfig`] builds the trait list from a TOML description.

pub mod call_status;
pub mod config;
pub mod crud;
pub mod entities;
pub mod fetch;
pub mod filter;
pub mod keys;
pub mod load_entity;
pub mod pagination;
pub mod payload;
pub mod selection;
pub mod sort;

pub use call_status::CallStatusTrait;
pub use config::{ConfigError, ConfigResult, FeatureConfig};
pub use crud::{compact, CrudConfig, CrudTrait, EntityChange};
pub use entities::{collection, EntitiesTrait};
pub use fetch::{
    EntitiesFetcher, EntityFetcher, FetchError, FetchRequest, FetchResponse,
    SharedEntitiesFetcher, SharedEntityFetcher,
};
pub use filter::{FilterConfig, FilterTrait};
pub use load_entity::LoadEntityTrait;
pub use pagination::{
    CacheType, PageCache, PageInfo, PagedRequest, PaginationConfig, PaginationState,
    PaginationTrait,
};
pub use selection::{MultiSelectionTrait, SelectionMode, SelectionStatus, SingleSelectionTrait};
pub use sort::{Sort, SortConfig, SortDirection, SortTrait};
