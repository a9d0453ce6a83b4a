//! Systems and the APIs and components that make them up.

use crate::error::ModelResult;
use crate::events::ResourceType;
use crate::identity::ResourceId;

use super::registry::{Registry, Stored};
use super::resource::{lazy_ref_accessors, link_ref, LazyRef, Resource, ResourceData};
use super::version::{ApiType, Version};
use super::ModelState;

#[derive(Debug, Default)]
pub struct SystemData {
    version: Version,
    is_abstract: bool,
    parent: Option<LazyRef<SystemData>>,
}

/// A software system. Abstract systems group concrete ones via `parent`.
pub type System = Resource<SystemData>;

impl ResourceData for SystemData {
    const RESOURCE_TYPE: ResourceType = ResourceType::System;
}

impl Stored for SystemData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.systems
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.systems
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.parent, &state.systems);
    }
}

impl System {
    #[must_use]
    pub fn version(&self) -> Version {
        self.read(|data| data.version.clone())
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_version(&self, version: Version) -> ModelResult<()> {
        self.update(|data| data.version = version)
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.read(|data| data.is_abstract)
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_abstract(&self, is_abstract: bool) -> ModelResult<()> {
        self.update(|data| data.is_abstract = is_abstract)
    }

    lazy_ref_accessors!(parent: System, parent_id, set_parent_by_id, set_parent_by_ref);
}

#[derive(Debug, Default)]
pub struct ApiData {
    version: Version,
    api_type: ApiType,
    system: Option<LazyRef<SystemData>>,
}

/// An interface published by a system.
pub type Api = Resource<ApiData>;

impl ResourceData for ApiData {
    const RESOURCE_TYPE: ResourceType = ResourceType::Api;
}

impl Stored for ApiData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.apis
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.apis
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.system, &state.systems);
    }
}

impl Api {
    #[must_use]
    pub fn version(&self) -> Version {
        self.read(|data| data.version.clone())
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_version(&self, version: Version) -> ModelResult<()> {
        self.update(|data| data.version = version)
    }

    #[must_use]
    pub fn api_type(&self) -> ApiType {
        self.read(|data| data.api_type)
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_api_type(&self, api_type: ApiType) -> ModelResult<()> {
        self.update(|data| data.api_type = api_type)
    }

    lazy_ref_accessors!(system: System, system_id, set_system_by_id, set_system_by_ref);
}

#[derive(Debug, Default)]
pub struct ComponentData {
    version: Version,
    system: Option<LazyRef<SystemData>>,
    consumes: Vec<ResourceId>,
    provides: Vec<ResourceId>,
}

/// A deployable part of a system, consuming and providing APIs.
pub type Component = Resource<ComponentData>;

impl ResourceData for ComponentData {
    const RESOURCE_TYPE: ResourceType = ResourceType::Component;
}

impl Stored for ComponentData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.components
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.components
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.system, &state.systems);
    }
}

impl Component {
    #[must_use]
    pub fn version(&self) -> Version {
        self.read(|data| data.version.clone())
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_version(&self, version: Version) -> ModelResult<()> {
        self.update(|data| data.version = version)
    }

    /// Ids of the APIs this component consumes.
    #[must_use]
    pub fn consumes(&self) -> Vec<ResourceId> {
        self.read(|data| data.consumes.clone())
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_consumes(&self, apis: Vec<ResourceId>) -> ModelResult<()> {
        self.update(|data| data.consumes = apis)
    }

    /// Ids of the APIs this component provides.
    #[must_use]
    pub fn provides(&self) -> Vec<ResourceId> {
        self.read(|data| data.provides.clone())
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    pub fn set_provides(&self, apis: Vec<ResourceId>) -> ModelResult<()> {
        self.update(|data| data.provides = apis)
    }

    lazy_ref_accessors!(system: System, system_id, set_system_by_id, set_system_by_ref);
}
