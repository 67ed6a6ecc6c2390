//! Runtime for composed entitykit features.
//!
//! [`FeatureStore`] holds a feature's state, reduces dispatched actions and
//! drives the feature's effect units on tokio. Each unit gets a worker that
//! applies its [`SchedulePolicy`](entitykit_compose::SchedulePolicy):
//!
//! - `CoalesceLatest`: debounce, latest action wins
//! - `SerializeFifo`: one run at a time, in arrival order
//! - `DropIfBusy`: single-flight per key
//! - `Concurrent`: every action runs at once
//!
//! ```ignore
//! let feature = FeatureConfig::load_from(path)?.compose()?;
//! let store = FeatureStore::new(feature, &collaborators)?;
//! store.dispatch_named("loadFirstPage", Value::Null)?;
//! store.settled().await;
//! let page: Vec<Entity> = store.select_with("selectPageEntities", None::<usize>)?;
//! ```

mod error;
mod scheduler;
mod store;

pub use error::{StoreError, StoreResult};
pub use store::FeatureStore;
