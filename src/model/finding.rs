//! Findings raised against stored resources.

use crate::error::ModelResult;
use crate::events::ResourceType;

use super::registry::{Registry, Stored};
use super::resource::{lazy_ref_accessors, link_ref, LazyRef, Resource, ResourceData};
use super::version::ResourceRef;
use super::ModelState;

#[derive(Debug, Default)]
pub struct FindingData {
    finding_type: Option<LazyRef<FindingTypeData>>,
    resources: Vec<ResourceRef>,
}

/// An observation about one or more resources. The display name holds the
/// finding's summary.
pub type Finding = Resource<FindingData>;

impl ResourceData for FindingData {
    const RESOURCE_TYPE: ResourceType = ResourceType::Finding;
}

impl Stored for FindingData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.findings
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.findings
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.finding_type, &state.finding_types);
    }
}

impl Finding {
    #[must_use]
    pub fn summary(&self) -> String {
        self.display_name()
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_summary(&self, summary: impl Into<String>) -> ModelResult<()> {
        self.set_display_name(summary)
    }

    /// Resources this finding is about.
    #[must_use]
    pub fn resources(&self) -> Vec<ResourceRef> {
        self.read(|data| data.resources.clone())
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_resources(&self, resources: Vec<ResourceRef>) -> ModelResult<()> {
        self.update(|data| data.resources = resources)
    }

    /// Appends one resource. Already listed resources are not repeated and
    /// cause no update.
    ///
    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn add_resource(&self, resource: ResourceRef) -> ModelResult<()> {
        self.update_if(|data| {
            if data.resources.contains(&resource) {
                return false;
            }
            data.resources.push(resource);
            true
        })?;
        Ok(())
    }

    lazy_ref_accessors!(
        finding_type: FindingType,
        finding_type_id,
        set_finding_type_by_id,
        set_finding_type_by_ref
    );
}

#[derive(Debug, Default)]
pub struct FindingTypeData;

pub type FindingType = Resource<FindingTypeData>;

impl ResourceData for FindingTypeData {
    const RESOURCE_TYPE: ResourceType = ResourceType::FindingType;
}

impl Stored for FindingTypeData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.finding_types
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.finding_types
    }
}
