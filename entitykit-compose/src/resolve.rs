//! Dependency ordering of feature traits.

use crate::error::{ComposeError, ComposeResult};
use std::collections::HashSet;

/// Ordering constraints of one trait.
#[derive(Debug, Clone)]
pub struct TraitNode {
    pub key: String,
    /// Must exist and be placed earlier.
    pub depends_on: Vec<String>,
    /// Placed earlier when present.
    pub runs_after: Vec<String>,
}

/// Orders `nodes` so every trait comes after the traits it depends on.
///
/// The order is stable: among traits whose dependencies are all placed, the
/// one listed first in the input goes next. Returns indices into `nodes`.
pub fn resolve_order(nodes: &[TraitNode]) -> ComposeResult<Vec<usize>> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.key.as_str()) {
            return Err(ComposeError::DuplicateTrait(node.key.clone()));
        }
    }
    for node in nodes {
        if let Some(missing) = node.depends_on.iter().find(|d| !seen.contains(d.as_str())) {
            return Err(ComposeError::UnknownDependency {
                trait_key: node.key.clone(),
                dependency: missing.clone(),
            });
        }
    }

    let edges: Vec<Vec<usize>> = nodes
        .iter()
        .map(|node| {
            node.depends_on
                .iter()
                .chain(&node.runs_after)
                .filter_map(|dep| nodes.iter().position(|n| &n.key == dep))
                .collect()
        })
        .collect();

    let mut placed = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    while order.len() < nodes.len() {
        let next = (0..nodes.len())
            .find(|&i| !placed[i] && edges[i].iter().all(|&dep| placed[dep]));
        match next {
            Some(i) => {
                placed[i] = true;
                order.push(i);
            }
            None => {
                return Err(ComposeError::CyclicDependency {
                    cycle: find_cycle(nodes, &edges, &placed),
                });
            }
        }
    }
    Ok(order)
}

/// Finds one cycle among the unplaced nodes, listed as keys with the first
/// key repeated at the end.
fn find_cycle(nodes: &[TraitNode], edges: &[Vec<usize>], placed: &[bool]) -> Vec<String> {
    fn visit(
        i: usize,
        edges: &[Vec<usize>],
        placed: &[bool],
        done: &mut [bool],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        if let Some(pos) = stack.iter().position(|&s| s == i) {
            let mut cycle = stack[pos..].to_vec();
            cycle.push(i);
            return Some(cycle);
        }
        if done[i] {
            return None;
        }
        stack.push(i);
        for &dep in &edges[i] {
            if placed[dep] {
                continue;
            }
            if let Some(cycle) = visit(dep, edges, placed, done, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        done[i] = true;
        None
    }

    let mut done = vec![false; nodes.len()];
    for start in (0..nodes.len()).filter(|&i| !placed[i]) {
        let mut stack = Vec::new();
        if let Some(cycle) = visit(start, edges, placed, &mut done, &mut stack) {
            // Edges point at dependencies; report in merge order instead.
            return cycle
                .into_iter()
                .rev()
                .map(|i| nodes[i].key.clone())
                .collect();
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, deps: &[&str]) -> TraitNode {
        TraitNode {
            key: key.into(),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            runs_after: Vec::new(),
        }
    }

    fn keys(nodes: &[TraitNode], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| nodes[i].key.clone()).collect()
    }

    #[test]
    fn independent_traits_keep_input_order() {
        let nodes = vec![node("a", &[]), node("b", &[]), node("c", &[])];
        let order = resolve_order(&nodes).unwrap();
        assert_eq!(keys(&nodes, &order), vec!["a", "b", "c"]);
    }

    #[test]
    fn dependencies_move_earlier() {
        let nodes = vec![node("crud", &["entities"]), node("x", &[]), node("entities", &[])];
        let order = resolve_order(&nodes).unwrap();
        assert_eq!(keys(&nodes, &order), vec!["x", "entities", "crud"]);
    }

    #[test]
    fn soft_ordering_applies_only_when_present() {
        let mut pagination = node("pagination", &["entities"]);
        pagination.runs_after = vec!["filter".into(), "sort".into()];
        let nodes = vec![
            node("entities", &[]),
            pagination,
            node("filter", &["entities"]),
        ];
        let order = resolve_order(&nodes).unwrap();
        assert_eq!(keys(&nodes, &order), vec!["entities", "filter", "pagination"]);
    }

    #[test]
    fn unknown_dependency_fails() {
        let nodes = vec![node("crud", &["entities"])];
        let err = resolve_order(&nodes).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::UnknownDependency { ref trait_key, ref dependency }
                if trait_key == "crud" && dependency == "entities"
        ));
    }

    #[test]
    fn duplicate_key_fails() {
        let nodes = vec![node("a", &[]), node("a", &[])];
        assert!(matches!(
            resolve_order(&nodes),
            Err(ComposeError::DuplicateTrait(ref k)) if k == "a"
        ));
    }

    #[test]
    fn cycle_is_reported_with_its_members() {
        let nodes = vec![node("free", &[]), node("a", &["c"]), node("b", &["a"]), node("c", &["b"])];
        let err = resolve_order(&nodes).unwrap_err();
        let ComposeError::CyclicDependency { cycle } = err else {
            panic!("expected a cycle error");
        };
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 4);
        for key in ["a", "b", "c"] {
            assert!(cycle.iter().any(|k| k == key));
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let nodes = vec![node("a", &["a"])];
        let err = resolve_order(&nodes).unwrap_err();
        assert!(matches!(err, ComposeError::CyclicDependency { ref cycle } if cycle == &["a", "a"]));
    }
}
