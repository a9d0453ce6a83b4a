//! Running instances of systems, APIs and components.

use crate::events::ResourceType;

use super::context::{Context, ContextData};
use super::registry::{Registry, Stored};
use super::resource::{lazy_ref_accessors, link_ref, LazyRef, Resource, ResourceData};
use super::system::{Api, ApiData, Component, ComponentData, System, SystemData};
use super::ModelState;

#[derive(Debug, Default)]
pub struct SystemInstanceData {
    system: Option<LazyRef<SystemData>>,
    context: Option<LazyRef<ContextData>>,
}

/// A system deployed into a context.
pub type SystemInstance = Resource<SystemInstanceData>;

impl ResourceData for SystemInstanceData {
    const RESOURCE_TYPE: ResourceType = ResourceType::SystemInstance;
}

impl Stored for SystemInstanceData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.system_instances
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.system_instances
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.system, &state.systems);
        link_ref(&mut self.context, &state.contexts);
    }
}

impl SystemInstance {
    lazy_ref_accessors!(system: System, system_id, set_system_by_id, set_system_by_ref);
    lazy_ref_accessors!(context: Context, context_id, set_context_by_id, set_context_by_ref);
}

#[derive(Debug, Default)]
pub struct ApiInstanceData {
    api: Option<LazyRef<ApiData>>,
    system_instance: Option<LazyRef<SystemInstanceData>>,
}

/// An API served by a system instance.
pub type ApiInstance = Resource<ApiInstanceData>;

impl ResourceData for ApiInstanceData {
    const RESOURCE_TYPE: ResourceType = ResourceType::ApiInstance;
}

impl Stored for ApiInstanceData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.api_instances
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.api_instances
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.api, &state.apis);
        link_ref(&mut self.system_instance, &state.system_instances);
    }
}

impl ApiInstance {
    lazy_ref_accessors!(api: Api, api_id, set_api_by_id, set_api_by_ref);
    lazy_ref_accessors!(
        system_instance: SystemInstance,
        system_instance_id,
        set_system_instance_by_id,
        set_system_instance_by_ref
    );
}

#[derive(Debug, Default)]
pub struct ComponentInstanceData {
    component: Option<LazyRef<ComponentData>>,
    system_instance: Option<LazyRef<SystemInstanceData>>,
}

/// A component running inside a system instance.
pub type ComponentInstance = Resource<ComponentInstanceData>;

impl ResourceData for ComponentInstanceData {
    const RESOURCE_TYPE: ResourceType = ResourceType::ComponentInstance;
}

impl Stored for ComponentInstanceData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.component_instances
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.component_instances
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.component, &state.components);
        link_ref(&mut self.system_instance, &state.system_instances);
    }
}

impl ComponentInstance {
    lazy_ref_accessors!(
        component: Component,
        component_id,
        set_component_by_id,
        set_component_by_ref
    );
    lazy_ref_accessors!(
        system_instance: SystemInstance,
        system_instance_id,
        set_system_instance_by_id,
        set_system_instance_by_ref
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::events::{ListSink, ResourceType};
    use crate::identity::ResourceId;
    use crate::model::Model;

    #[test]
    fn test_instance_chain_resolves() {
        let model = Model::new(Arc::new(ListSink::new()));

        let system = model.new_system(ResourceId::new());
        let context = model.new_context(ResourceId::new());
        let api = model.new_api(ResourceId::new());
        model.add_system(&system).unwrap();
        model.add_context(&context).unwrap();
        model.add_api(&api).unwrap();

        let si = model.new_system_instance(ResourceId::new());
        si.set_system_by_id(system.id()).unwrap();
        si.set_context_by_id(context.id()).unwrap();
        model.add_system_instance(&si).unwrap();

        let ai = model.new_api_instance(ResourceId::new());
        ai.set_api_by_ref(&api).unwrap();
        ai.set_system_instance_by_id(si.id()).unwrap();
        model.add_api_instance(&ai).unwrap();

        let resolved_si = ai.system_instance().unwrap().unwrap();
        assert!(Arc::ptr_eq(&resolved_si, &si));
        assert!(Arc::ptr_eq(&resolved_si.system().unwrap().unwrap(), &system));
        assert!(Arc::ptr_eq(&resolved_si.context().unwrap().unwrap(), &context));
        assert!(Arc::ptr_eq(&ai.api().unwrap().unwrap(), &api));
    }

    #[test]
    fn test_system_prepopulated_when_instance_is_added() {
        let model = Model::new(Arc::new(ListSink::new()));
        let system = model.new_system(ResourceId::new());

        let si = model.new_system_instance(ResourceId::new());
        si.set_system_by_id(system.id()).unwrap();
        model.add_system(&system).unwrap();
        model.add_system_instance(&si).unwrap();

        // resolvable without the store once linked at add time
        model.delete_system_by_id(system.id()).unwrap();
        assert!(Arc::ptr_eq(&si.system().unwrap().unwrap(), &system));
    }

    #[test]
    fn test_component_instance_dangling_component() {
        let model = Model::new(Arc::new(ListSink::new()));
        let ci = model.new_component_instance(ResourceId::new());
        let missing = ResourceId::new();
        ci.set_component_by_id(missing).unwrap();
        model.add_component_instance(&ci).unwrap();

        assert_eq!(ci.component_id(), Some(missing));
        assert!(ci
            .component()
            .unwrap_err()
            .is_not_found_for(ResourceType::Component));
        assert!(ci.system_instance().unwrap().is_none());
    }
}
