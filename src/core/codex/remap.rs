//! Identifier remapping for a single clone operation.

use std::collections::{BTreeMap, HashMap};

use crate::database::EntityKind;

/// Per-kind old-id → new-id mapping, alive for one clone.
///
/// Lookups for an id that was never recorded return `None`; callers use that
/// to decide whether a join row can be carried over.
#[derive(Debug, Default)]
pub struct IdRemapper {
    forward: HashMap<EntityKind, HashMap<String, String>>,
    reverse: HashMap<EntityKind, HashMap<String, String>>,
}

impl IdRemapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `old_id` of `kind` was cloned as `new_id`.
    pub fn record(&mut self, kind: EntityKind, old_id: impl Into<String>, new_id: impl Into<String>) {
        let old_id = old_id.into();
        let new_id = new_id.into();
        self.reverse
            .entry(kind)
            .or_default()
            .insert(new_id.clone(), old_id.clone());
        self.forward.entry(kind).or_default().insert(old_id, new_id);
    }

    /// New id for a source row, if it was cloned.
    pub fn get(&self, kind: EntityKind, old_id: &str) -> Option<&str> {
        self.forward
            .get(&kind)
            .and_then(|ids| ids.get(old_id))
            .map(String::as_str)
    }

    /// Source id a cloned row was created from.
    pub fn original(&self, kind: EntityKind, new_id: &str) -> Option<&str> {
        self.reverse
            .get(&kind)
            .and_then(|ids| ids.get(new_id))
            .map(String::as_str)
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.forward.get(&kind).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.forward.values().all(HashMap::is_empty)
    }

    /// Number of mapped rows per kind, including kinds with no rows
    pub fn counts(&self) -> BTreeMap<EntityKind, usize> {
        EntityKind::ALL
            .iter()
            .map(|kind| (*kind, self.len(*kind)))
            .collect()
    }
}
