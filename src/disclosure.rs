use crate::models::{RecordId, ReferenceCategory};
use crate::resolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosureKey {
    pub category: ReferenceCategory,
    pub entity_id: RecordId,
}

impl DisclosureKey {
    pub fn new(category: ReferenceCategory, entity_id: impl Into<RecordId>) -> Self {
        Self {
            category,
            entity_id: entity_id.into(),
        }
    }
}

/// Expand/collapse flags keyed by `(category, entity id)`.
///
/// Only expanded pairs are stored; a missing key reads as collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosureState {
    expanded: BTreeSet<DisclosureKey>,
}

impl DisclosureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, category: ReferenceCategory, entity_id: &str) -> bool {
        self.expanded.contains(&DisclosureKey::new(category, entity_id))
    }

    pub fn toggle(&mut self, category: ReferenceCategory, entity_id: &str) -> bool {
        let key = DisclosureKey::new(category, entity_id);
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn toggled(&self, category: ReferenceCategory, entity_id: &str) -> Self {
        let mut next = self.clone();
        next.toggle(category, entity_id);
        next
    }

    pub fn preview_limit(&self, category: ReferenceCategory, entity_id: &str) -> Option<usize> {
        resolver::preview_limit(self.is_expanded(category, entity_id))
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    pub fn reset(&mut self) {
        self.expanded.clear();
    }
}
