//! Naming convention for async-call keys.
//!
//! Traits that track an asynchronous call (loading entities, a checkout
//! request, ...) name their actions, state field and selectors after a base
//! name. Deriving them in one place keeps every such trait consistent.

/// Every name derived from a base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncKeys {
    /// Action that starts the call, e.g. `loadEntities`.
    pub call: String,
    /// Action reporting success, e.g. `loadEntitiesSuccess`.
    pub success: String,
    /// Action reporting failure, e.g. `loadEntitiesFail`.
    pub fail: String,
    /// State field holding the call status, e.g. `entitiesStatus`.
    pub status: String,
    /// Selector: call in progress, e.g. `isEntitiesLoading`.
    pub loading: String,
    /// Selector: call succeeded, e.g. `isEntitiesLoaded`.
    pub loaded: String,
    /// Selector: call failed, e.g. `isEntitiesFail`.
    pub failed: String,
    /// Selector: the failure value, e.g. `selectEntitiesError`.
    pub error: String,
}

/// Derives the async-call names for `base` with a `load` prefix on the call
/// action: `derive_keys("entities").call` is `loadEntities`.
#[must_use]
pub fn derive_keys(base: &str) -> AsyncKeys {
    derive_keys_with_verb("load", base)
}

/// Derives the async-call names for `base` using `verb` as the call prefix.
/// An empty verb uses `base` itself as the call action.
#[must_use]
pub fn derive_keys_with_verb(verb: &str, base: &str) -> AsyncKeys {
    let name = capitalize(base);
    let call = if verb.is_empty() {
        lower_first(base)
    } else {
        format!("{verb}{name}")
    };
    AsyncKeys {
        success: format!("{call}Success"),
        fail: format!("{call}Fail"),
        status: format!("{}Status", lower_first(base)),
        loading: format!("is{name}Loading"),
        loaded: format!("is{name}Loaded"),
        failed: format!("is{name}Fail"),
        error: format!("select{name}Error"),
        call,
    }
}

/// Uppercases the first character.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
