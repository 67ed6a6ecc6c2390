//! Feature config inspector.
//!
//! Composes the feature a config file describes and prints its trait order,
//! actions and selectors. With a fixture (a JSON array of entities) it also
//! runs the first load against the fixture and prints what the feature
//! shows.
//!
//! Usage:
//!   entitykit-inspect feature.toml --fixture entities.json

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use entitykit_compose::{derive_keys, Collaborators};
use entitykit_runtime::FeatureStore;
use entitykit_traits::fetch::{
    EntitiesFetcher, EntityFetcher, FetchError, FetchRequest, FetchResponse,
    SharedEntitiesFetcher, SharedEntityFetcher,
};
use entitykit_traits::keys::{
    ENTITIES, LOAD_FIRST_PAGE, SELECT_ALL, SELECT_PAGE_ENTITIES, SELECT_PAGE_INFO,
};
use entitykit_traits::{FeatureConfig, PageInfo};
use entitykit_types::{Entity, EntityId};
use serde_json::Value;
use std::{fs, path::PathBuf, sync::Arc};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "entitykit-inspect")]
#[command(about = "Compose a feature from its config and show what it contains")]
struct Args {
    /// Feature config (TOML)
    config: PathBuf,

    /// JSON array of entities to serve as the backend
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Serves a fixed list of entities, honoring the paged request.
struct FixtureBackend {
    entities: Vec<Entity>,
}

#[async_trait]
impl EntitiesFetcher for FixtureBackend {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        if request.filter.is_some() || request.sort.is_some() {
            debug!("Fixture backend ignores filter and sort criteria");
        }
        let total = self.entities.len();
        let (start, end) = match request.page {
            Some(page) => {
                let end = page.size.map_or(total, |size| page.start_index + size);
                (page.start_index.min(total), end.min(total))
            }
            None => (0, total),
        };
        Ok(FetchResponse::new(self.entities[start..end].to_vec()).with_total(total))
    }
}

#[async_trait]
impl EntityFetcher for FixtureBackend {
    async fn fetch_one(&self, id: EntityId) -> Result<Entity, FetchError> {
        self.entities
            .iter()
            .find(|e| *e.id() == id)
            .cloned()
            .ok_or(FetchError::NotFound(id))
    }
}

fn ids(entities: &[Entity]) -> String {
    entities
        .iter()
        .map(|e| e.id().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = FeatureConfig::load_from(&args.config)?;
    let feature = config.compose()?;

    println!("Traits:    {}", feature.trait_keys().join(" -> "));
    println!("Actions:   {}", feature.actions().names().collect::<Vec<_>>().join(", "));
    println!("Selectors: {}", feature.selectors().names().collect::<Vec<_>>().join(", "));

    let Some(fixture) = args.fixture else {
        return Ok(());
    };
    let contents = fs::read_to_string(&fixture)
        .with_context(|| format!("Failed to read fixture {}", fixture.display()))?;
    let entities: Vec<Entity> = serde_json::from_str(&contents)
        .with_context(|| format!("Fixture {} is not a list of entities", fixture.display()))?;
    info!("Serving {} fixture entities", entities.len());

    let backend = Arc::new(FixtureBackend { entities });
    let list: SharedEntitiesFetcher = backend.clone();
    let single: SharedEntityFetcher = backend;
    let collaborators = Collaborators::new().with(list).with(single);

    let paginated = feature.actions().contains(LOAD_FIRST_PAGE);
    let store = FeatureStore::new(feature, &collaborators)?;
    let first_load = if paginated {
        LOAD_FIRST_PAGE.to_string()
    } else {
        derive_keys(ENTITIES).call
    };
    store.dispatch_named(&first_load, Value::Null)?;
    store.settled().await;

    if paginated {
        let info: PageInfo = store.select(SELECT_PAGE_INFO)?;
        let page: Vec<Entity> = store.select_with(SELECT_PAGE_ENTITIES, None::<usize>)?;
        println!(
            "Page {} of {} ({} cache): {}",
            info.page_index + 1,
            info.pages_count.map_or_else(|| "?".to_string(), |n| n.to_string()),
            serde_json::to_string(&info.cache_type)?.trim_matches('"'),
            ids(&page)
        );
    } else {
        let visible: Vec<Entity> = store.select(SELECT_ALL)?;
        println!("Entities ({}): {}", visible.len(), ids(&visible));
    }

    Ok(())
}
