//! The composed feature's state record.
//!
//! Each trait owns one or more named fields. A field holds a typed value
//! behind an `Arc`, so producing the next state clones the record's spine
//! but shares every field that did not change. Readers downcast to the type
//! the owning trait stored; a wrong type reads as absent.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
struct Field {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Immutable, structurally shared state of a composed feature.
#[derive(Clone, Default)]
pub struct FeatureState {
    fields: BTreeMap<String, Field>,
}

impl FeatureState {
    /// Creates an empty state record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a field as `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.fields.get(key)?.value.downcast_ref::<T>()
    }

    /// Reads a field as `T`, falling back to `T::default()` when the field is
    /// absent or holds another type.
    #[must_use]
    pub fn get_or_default<T: Any + Send + Sync + Clone + Default>(&self, key: &str) -> T {
        self.get::<T>(key).cloned().unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stores `value` under `key`, replacing any previous field.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.fields.insert(
            key.into(),
            Field {
                value: Arc::new(value),
                type_name: type_name::<T>(),
            },
        );
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the next state with field `key` transformed by `f`.
    ///
    /// The field is cloned before `f` runs. A missing field or a field of
    /// another type is logged and leaves the state unchanged.
    #[must_use]
    pub fn update<T, F>(self, key: &str, f: F) -> Self
    where
        T: Any + Send + Sync + Clone,
        F: FnOnce(&mut T),
    {
        let Some(current) = self.get::<T>(key) else {
            warn!("State field {} is missing or not a {}", key, type_name::<T>());
            return self;
        };
        let mut next = current.clone();
        f(&mut next);
        self.with(key.to_string(), next)
    }

    /// Copies the fields of `other` over this record.
    pub fn extend(&mut self, other: FeatureState) {
        self.fields.extend(other.fields);
    }

    /// Type name stored under `key`, for diagnostics.
    pub fn type_of(&self, key: &str) -> Option<&'static str> {
        self.fields.get(key).map(|f| f.type_name)
    }

    /// True when both records hold the very same value for `key`.
    ///
    /// Selector memoization and "did this field change" checks use this
    /// instead of a deep comparison.
    pub fn same_field(&self, other: &Self, key: &str) -> bool {
        match (self.fields.get(key), other.fields.get(key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a.value, &b.value),
            (None, None) => true,
            _ => false,
        }
    }

    /// True when every field of both records is shared, i.e. no transition
    /// happened between them.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.iter().all(|(key, field)| {
                other
                    .fields
                    .get(key)
                    .is_some_and(|o| Arc::ptr_eq(&field.value, &o.value))
            })
    }
}

impl fmt::Debug for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(k, v)| (k, v.type_name)))
            .finish()
    }
}
