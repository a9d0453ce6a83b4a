//! Per-kind storage behind the model.
//!
//! One [`Registry`] per entity kind maps ids to the stored entity and keeps
//! a cached snapshot of all entries for list queries. Any successful write
//! drops the snapshot; the next list query rebuilds it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::identity::ResourceId;

use super::resource::{Resource, ResourceData};
use super::ModelState;

/// Kinds the model knows how to store.
pub(crate) trait Stored: ResourceData {
    fn registry(state: &ModelState) -> &Registry<Self>;

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self>;

    /// Fills the cache of lazy references whose targets are already stored.
    /// Called while the entity is being added.
    fn link(&mut self, _state: &ModelState) {}
}

pub(crate) struct Registry<D: ResourceData> {
    by_id: HashMap<ResourceId, Arc<Resource<D>>>,
    snapshot: Option<Vec<Arc<Resource<D>>>>,
}

impl<D: ResourceData> Default for Registry<D> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            snapshot: None,
        }
    }
}

impl<D: ResourceData> Registry<D> {
    pub(crate) fn get(&self, id: ResourceId) -> Option<Arc<Resource<D>>> {
        self.by_id.get(&id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Stores `resource` under its id, returning the entity it replaced.
    pub(crate) fn insert(&mut self, resource: Arc<Resource<D>>) -> Option<Arc<Resource<D>>> {
        self.snapshot = None;
        self.by_id.insert(resource.id(), resource)
    }

    pub(crate) fn remove(&mut self, id: ResourceId) -> Option<Arc<Resource<D>>> {
        let removed = self.by_id.remove(&id);
        if removed.is_some() {
            self.snapshot = None;
        }
        removed
    }

    /// All stored entities, in no particular order. Served from the
    /// snapshot when one is present.
    pub(crate) fn all(&mut self) -> Vec<Arc<Resource<D>>> {
        let by_id = &self.by_id;
        self.snapshot
            .get_or_insert_with(|| by_id.values().cloned().collect())
            .clone()
    }

    #[cfg(test)]
    pub(crate) const fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}
