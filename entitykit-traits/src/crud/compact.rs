//! Change-log compaction.

use entitykit_types::{Change, ChangeType, EntityId};
use std::collections::HashMap;

/// Reduces a change log to at most one net entry per ID.
///
/// Walks the log once:
/// - the first entry for an ID is kept;
/// - a later `updated` or `created` entry for a seen ID is dropped;
/// - a later `deleted` entry cancels a kept `created` entry (both vanish
///   and the ID is forgotten);
/// - a later `deleted` entry replaces any other kept entry and moves to the
///   end of the log.
///
/// Compacting a compacted log returns it unchanged.
pub fn compact(log: &[Change]) -> Vec<Change> {
    let mut result: Vec<Change> = Vec::with_capacity(log.len());
    let mut seen: HashMap<&EntityId, ChangeType> = HashMap::new();

    for change in log {
        match (seen.get(&change.id).copied(), change.change_type) {
            (None, change_type) => {
                seen.insert(&change.id, change_type);
                result.push(change.clone());
            }
            (Some(ChangeType::Created), ChangeType::Deleted) => {
                seen.remove(&change.id);
                result.retain(|kept| kept.id != change.id);
            }
            (Some(_), ChangeType::Deleted) => {
                seen.insert(&change.id, ChangeType::Deleted);
                result.retain(|kept| kept.id != change.id);
                result.push(change.clone());
            }
            (Some(_), ChangeType::Created | ChangeType::Updated) => {}
        }
    }
    result
}

/// Points every entry for `from` at `to`, after an update renamed the
/// entity.
pub fn retarget(log: &mut [Change], from: &EntityId, to: &EntityId) {
    for change in log.iter_mut().filter(|c| &c.id == from) {
        change.id = to.clone();
    }
}
