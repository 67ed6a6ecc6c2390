//! Feature configuration files.
//!
//! A feature's built-in traits can be described in TOML, one table per
//! trait namespace:
//!
//! ```toml
//! selection = "multi"
//! loadEntity = true
//!
//! [pagination]
//! cacheType = "partial"
//! pageSize = 20
//! pagesToCache = 3
//!
//! [filter]
//! defaultDebounceTime = 250
//!
//! [crud]
//! storeChanges = true
//! ```
//!
//! The entities trait is always included. A section that is absent leaves
//! its trait out.

use crate::call_status::CallStatusTrait;
use crate::crud::{CrudConfig, CrudTrait};
use crate::entities::EntitiesTrait;
use crate::filter::{FilterConfig, FilterTrait};
use crate::load_entity::LoadEntityTrait;
use crate::pagination::{PaginationConfig, PaginationTrait};
use crate::selection::{MultiSelectionTrait, SelectionMode, SingleSelectionTrait};
use crate::sort::{SortConfig, SortTrait};
use entitykit_compose::{compose, ComposeError, Feature, FeatureTrait};
use entitykit_types::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read feature config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse feature config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which built-in traits a feature uses, and their settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crud: Option<CrudConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionMode>,
    #[serde(default)]
    pub load_entity: bool,
    /// Names of extra async calls to track, e.g. `["checkout"]`.
    #[serde(default)]
    pub call_statuses: Vec<String>,
}

impl FeatureConfig {
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads a config file.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded feature config from {:?}", path);
        Ok(config)
    }

    /// Filters locally with `f`, adding a filter section if there is none.
    #[must_use]
    pub fn with_filter_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Entity, &Value) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(self.filter.unwrap_or_default().with_filter_fn(f));
        self
    }

    /// The configured traits, entities first.
    pub fn traits(&self) -> Vec<Box<dyn FeatureTrait>> {
        let mut traits: Vec<Box<dyn FeatureTrait>> = vec![Box::new(EntitiesTrait::new())];
        if let Some(config) = &self.filter {
            traits.push(Box::new(FilterTrait::new(config.clone())));
        }
        if let Some(config) = &self.sort {
            traits.push(Box::new(SortTrait::new(config.clone())));
        }
        if let Some(config) = &self.crud {
            traits.push(Box::new(CrudTrait::new(config.clone())));
        }
        if let Some(config) = &self.pagination {
            traits.push(Box::new(PaginationTrait::new(config.clone())));
        }
        match self.selection {
            Some(SelectionMode::Single) => traits.push(Box::new(SingleSelectionTrait::new())),
            Some(SelectionMode::Multi) => traits.push(Box::new(MultiSelectionTrait::new())),
            None => {}
        }
        if self.load_entity {
            traits.push(Box::new(LoadEntityTrait::new()));
        }
        for name in &self.call_statuses {
            traits.push(Box::new(CallStatusTrait::new(name)));
        }
        debug!("Feature config yields {} traits", traits.len());
        traits
    }

    /// Composes the configured traits into a feature.
    pub fn compose(&self) -> ConfigResult<Feature> {
        Ok(compose(self.traits())?)
    }
}
