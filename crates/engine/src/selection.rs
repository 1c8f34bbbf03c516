use serde::Serialize;

use crate::asset::AssetId;
use crate::catalog::AssetCatalog;

/// Ids picked in the library panel, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet {
    ids: Vec<AssetId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[AssetId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.ids.contains(id)
    }

    /// Replace the selection, keeping first occurrences only.
    pub fn install(&mut self, ids: impl IntoIterator<Item = AssetId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: AssetId) -> bool {
        match self.ids.iter().position(|selected| selected == &id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(id);
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn retain_existing(&mut self, catalog: &AssetCatalog) {
        self.ids.retain(|id| catalog.contains(id));
    }
}
