//! The trait composer.
//!
//! Orders descriptors by their dependencies, then walks them once, threading
//! a [`CompositionContext`] through each trait's factories. Every collision
//! is detected here, before any action is reduced.

use crate::context::CompositionContext;
use crate::descriptor::FeatureTrait;
use crate::error::{ComposeError, ComposeResult, ContributionKind};
use crate::feature::Feature;
use crate::reducer::combine;
use crate::registry::ConfigRecord;
use crate::resolve::{resolve_order, TraitNode};
use crate::state::FeatureState;
use std::collections::HashMap;
use tracing::debug;

/// Composes `traits` into one feature.
pub fn compose(traits: Vec<Box<dyn FeatureTrait>>) -> ComposeResult<Feature> {
    let nodes: Vec<TraitNode> = traits
        .iter()
        .map(|t| TraitNode {
            key: t.key().to_string(),
            depends_on: t.depends_on(),
            runs_after: t.runs_after(),
        })
        .collect();
    let order = resolve_order(&nodes)?;
    let ordered: Vec<&dyn FeatureTrait> = order.iter().map(|&i| traits[i].as_ref()).collect();
    let keys: Vec<String> = ordered.iter().map(|t| t.key().to_string()).collect();
    debug!("Resolved trait order {:?}", keys);

    // Configs are declared data, so they are all known before the walk and
    // any factory may check whether another trait is configured.
    let mut configs = ConfigRecord::new();
    for t in &ordered {
        t.validate()?;
        if let Some(config) = t.config() {
            let mut fragment = ConfigRecord::new();
            fragment.insert_value(t.key(), config);
            configs.merge(fragment, t.key(), &[])?;
        }
    }

    let mut ctx = CompositionContext {
        trait_keys: keys.clone(),
        configs,
        ..CompositionContext::default()
    };
    let mut state_owners = HashMap::new();
    let mut fragments = Vec::new();
    let mut effects = Vec::new();

    for t in &ordered {
        let key = t.key();
        let shadows = t.shadows();
        check_shadows(&ctx, key, &shadows)?;

        let actions = t.actions(&ctx)?;
        ctx.actions.merge(actions, key, &shadows)?;

        let selectors = t.selectors(&ctx)?;
        ctx.selectors.merge(selectors, key, &shadows)?;

        let mutators = t.mutators(&ctx)?;
        ctx.mutators.merge(mutators, key, &shadows)?;

        let contributed = t.initial_state(&ctx)?;
        ctx.initial_state = merge_state(&ctx.initial_state, contributed, key, &shadows, &mut state_owners)?;

        if let Some(reducer) = t.reducer(&ctx)? {
            fragments.push(reducer);
        }
        effects.extend(t.effects(&ctx)?);

        debug!(
            "Merged trait {} ({} actions, {} selectors, {} mutators so far)",
            key,
            ctx.actions.len(),
            ctx.selectors.len(),
            ctx.mutators.len()
        );
    }

    Ok(Feature {
        order: keys,
        initial_state: ctx.initial_state,
        configs: ctx.configs,
        actions: ctx.actions,
        selectors: ctx.selectors,
        mutators: ctx.mutators,
        reducer: combine(fragments),
        effects,
    })
}

/// Every shadowed name must already be provided by an earlier trait, as
/// an action, selector, mutator or state field.
fn check_shadows(ctx: &CompositionContext, trait_key: &str, shadows: &[String]) -> ComposeResult<()> {
    let unknown = shadows.iter().find(|name| {
        !(ctx.actions.contains(name)
            || ctx.selectors.contains(name)
            || ctx.mutators.contains(name)
            || ctx.initial_state.contains(name))
    });
    match unknown {
        Some(name) => Err(ComposeError::NothingToShadow {
            key: name.clone(),
            trait_key: trait_key.to_string(),
        }),
        None => Ok(()),
    }
}

/// Shallow record union of the state so far and one trait's fields.
fn merge_state(
    previous: &FeatureState,
    contributed: FeatureState,
    trait_key: &str,
    shadows: &[String],
    owners: &mut HashMap<String, String>,
) -> ComposeResult<FeatureState> {
    for field in contributed.keys() {
        let shadowing = shadows.iter().any(|s| s == field);
        if previous.contains(field) && !shadowing {
            return Err(ComposeError::DuplicateKey {
                kind: ContributionKind::StateField,
                key: field.to_string(),
                trait_key: trait_key.to_string(),
                owner: owners.get(field).cloned().unwrap_or_default(),
            });
        }
    }
    for field in contributed.keys() {
        owners.insert(field.to_string(), trait_key.to_string());
    }
    let mut next = previous.clone();
    next.extend(contributed);
    Ok(next)
}
