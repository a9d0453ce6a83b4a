//! The in-memory landscape model.
//!
//! A [`Model`] owns one registry per entity kind and reports every change to
//! the event sink it was built with:
//!
//! - adding an entity emits `Create`, or `Update` when the id is already
//!   stored (the new instance replaces the old one);
//! - deleting emits `Delete` with no payload;
//! - setters on a registered entity emit `Update`.
//!
//! Mutations and their events are serialized by one re-entrant gate, so a
//! sink sees changes in the order they were applied and never observes a
//! half-applied add. The store itself is guarded separately and is never
//! locked while the sink runs, so sinks may read the model.
//!
//! Lock order is gate, then store, then an entity's field lock. No entity
//! lock is held while the sink runs.

mod annotations;
mod context;
mod finding;
mod instance;
mod node;
mod registry;
mod resource;
mod system;
mod version;

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::events::{EventSink, Operation, Payload, ResourceType};
use crate::identity::ResourceId;

use registry::{Registry, Stored};

pub use annotations::Annotations;
pub use context::{Context, ContextData, ContextType, ContextTypeData};
pub use finding::{Finding, FindingData, FindingType, FindingTypeData};
pub use instance::{
    ApiInstance, ApiInstanceData, ComponentInstance, ComponentInstanceData, SystemInstance,
    SystemInstanceData,
};
pub use node::{Node, NodeData, NodeType, NodeTypeData};
pub use resource::{AnyResource, LazyRef, RegistrationState, Resource, ResourceData};
pub use system::{Api, ApiData, Component, ComponentData, System, SystemData};
pub use version::{ApiType, ResourceRef, Version};

#[derive(Default)]
pub(crate) struct ModelState {
    pub(crate) contexts: Registry<ContextData>,
    pub(crate) context_types: Registry<ContextTypeData>,
    pub(crate) systems: Registry<SystemData>,
    pub(crate) apis: Registry<ApiData>,
    pub(crate) components: Registry<ComponentData>,
    pub(crate) system_instances: Registry<SystemInstanceData>,
    pub(crate) api_instances: Registry<ApiInstanceData>,
    pub(crate) component_instances: Registry<ComponentInstanceData>,
    pub(crate) nodes: Registry<NodeData>,
    pub(crate) node_types: Registry<NodeTypeData>,
    pub(crate) findings: Registry<FindingData>,
    pub(crate) finding_types: Registry<FindingTypeData>,
}

impl ModelState {
    fn len_of(&self, resource_type: ResourceType) -> usize {
        match resource_type {
            ResourceType::Context => self.contexts.len(),
            ResourceType::ContextType => self.context_types.len(),
            ResourceType::System => self.systems.len(),
            ResourceType::Api => self.apis.len(),
            ResourceType::Component => self.components.len(),
            ResourceType::SystemInstance => self.system_instances.len(),
            ResourceType::ApiInstance => self.api_instances.len(),
            ResourceType::ComponentInstance => self.component_instances.len(),
            ResourceType::Node => self.nodes.len(),
            ResourceType::NodeType => self.node_types.len(),
            ResourceType::Finding => self.findings.len(),
            ResourceType::FindingType => self.finding_types.len(),
            ResourceType::Annotations | ResourceType::Unknown => 0,
        }
    }
}

pub(crate) struct ModelCore {
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) gate: ReentrantMutex<()>,
    pub(crate) state: RwLock<ModelState>,
}

impl ModelCore {
    pub(crate) fn lookup<D: Stored>(&self, id: ResourceId) -> Option<Arc<Resource<D>>> {
        let state = self.state.read();
        D::registry(&state).get(id)
    }
}

/// Handle to an in-memory landscape model.
///
/// Cloning the handle is cheap and yields another handle to the same store.
/// Entities hold only a weak link back, so dropping the last handle drops
/// the store.
#[derive(Clone)]
pub struct Model {
    core: Arc<ModelCore>,
}

impl Model {
    /// Creates an empty model reporting every change to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            core: Arc::new(ModelCore {
                sink,
                gate: ReentrantMutex::new(()),
                state: RwLock::new(ModelState::default()),
            }),
        }
    }

    /// The sink this model reports to.
    #[must_use]
    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.core.sink)
    }

    /// Number of stored entities of one kind.
    #[must_use]
    pub fn len_of(&self, resource_type: ResourceType) -> usize {
        self.core.state.read().len_of(resource_type)
    }

    pub(crate) fn downgrade(&self) -> Weak<ModelCore> {
        Arc::downgrade(&self.core)
    }

    fn add<D: Stored>(&self, resource: &Arc<Resource<D>>) -> ModelResult<()> {
        let id = resource.id();
        if id.is_nil() {
            return Err(ModelError::IdentityNotSet);
        }
        if !resource.belongs_to(&self.core) {
            return Err(ModelError::ModelMismatch { id });
        }

        let _gate = self.core.gate.lock();
        let previous = {
            let mut state = self.core.state.write();
            resource.link_with(&state);
            D::registry_mut(&mut state).insert(Arc::clone(resource))
        };
        let operation = if previous.is_some() {
            Operation::Update
        } else {
            Operation::Create
        };

        let payload: Arc<dyn AnyResource> = resource.clone();
        if let Err(err) = self
            .core
            .sink
            .receive(D::RESOURCE_TYPE, operation, id, &[Payload::Resource(payload)])
        {
            let mut state = self.core.state.write();
            let registry = D::registry_mut(&mut state);
            match previous {
                Some(previous) => {
                    registry.insert(previous);
                }
                None => {
                    registry.remove(id);
                }
            }
            return Err(err.into());
        }

        resource.mark_registered();
        debug!(resource_type = %D::RESOURCE_TYPE, %id, %operation, "resource stored");
        Ok(())
    }

    fn delete<D: Stored>(&self, id: ResourceId) -> ModelResult<()> {
        let _gate = self.core.gate.lock();
        let removed = D::registry_mut(&mut self.core.state.write())
            .remove(id)
            .ok_or_else(|| ModelError::not_found(D::RESOURCE_TYPE, id))?;

        if let Err(err) = self
            .core
            .sink
            .receive(D::RESOURCE_TYPE, Operation::Delete, id, &[])
        {
            D::registry_mut(&mut self.core.state.write()).insert(removed);
            return Err(err.into());
        }

        debug!(resource_type = %D::RESOURCE_TYPE, %id, "resource deleted");
        Ok(())
    }

    fn get<D: Stored>(&self, id: ResourceId) -> Option<Arc<Resource<D>>> {
        self.core.lookup(id)
    }

    fn all<D: Stored>(&self) -> Vec<Arc<Resource<D>>> {
        D::registry_mut(&mut self.core.state.write()).all()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Model");
        if let Some(state) = self.core.state.try_read() {
            for resource_type in ResourceType::ALL {
                let len = state.len_of(resource_type);
                if len > 0 {
                    s.field(resource_type.name(), &len);
                }
            }
        }
        s.finish_non_exhaustive()
    }
}

macro_rules! registry_api {
    ($(
        $kind:literal => $alias:ident($data:ty) {
            $new:ident, $add:ident, $delete:ident, $get:ident, $all:ident
        }
    )*) => {
        impl Model {
            $(
                #[doc = concat!("Creates an unregistered ", $kind, " bound to this model.")]
                #[must_use]
                pub fn $new(&self, id: ResourceId) -> Arc<$alias> {
                    Resource::new(self, id)
                }

                #[doc = concat!("Stores a ", $kind, ", replacing any ", $kind, " with the same id.")]
                ///
                /// Emits `Create`, or `Update` on replacement, then marks the
                /// entity registered.
                ///
                /// # Errors
                ///
                /// `IdentityNotSet` for a nil id, `ModelMismatch` for an entity
                /// created by another model, or the sink's error, in which case
                /// the store is left as it was.
                pub fn $add(&self, resource: &Arc<$alias>) -> ModelResult<()> {
                    self.add(resource)
                }

                #[doc = concat!("Removes a ", $kind, " and emits `Delete`.")]
                ///
                /// # Errors
                ///
                /// The kind's `NotFound` if the id is not stored, or the sink's
                /// error, in which case the entity stays stored.
                pub fn $delete(&self, id: ResourceId) -> ModelResult<()> {
                    self.delete::<$data>(id)
                }

                #[doc = concat!("Looks up a stored ", $kind, ".")]
                #[must_use]
                pub fn $get(&self, id: ResourceId) -> Option<Arc<$alias>> {
                    self.get(id)
                }

                #[doc = concat!("All stored ", $kind, " entities, in no particular order.")]
                #[must_use]
                pub fn $all(&self) -> Vec<Arc<$alias>> {
                    self.all()
                }
            )*
        }
    };
}

registry_api! {
    "context" => Context(ContextData) {
        new_context, add_context, delete_context_by_id, context_by_id, contexts
    }
    "context type" => ContextType(ContextTypeData) {
        new_context_type, add_context_type, delete_context_type_by_id, context_type_by_id,
        context_types
    }
    "system" => System(SystemData) {
        new_system, add_system, delete_system_by_id, system_by_id, systems
    }
    "API" => Api(ApiData) {
        new_api, add_api, delete_api_by_id, api_by_id, apis
    }
    "component" => Component(ComponentData) {
        new_component, add_component, delete_component_by_id, component_by_id, components
    }
    "system instance" => SystemInstance(SystemInstanceData) {
        new_system_instance, add_system_instance, delete_system_instance_by_id,
        system_instance_by_id, system_instances
    }
    "API instance" => ApiInstance(ApiInstanceData) {
        new_api_instance, add_api_instance, delete_api_instance_by_id, api_instance_by_id,
        api_instances
    }
    "component instance" => ComponentInstance(ComponentInstanceData) {
        new_component_instance, add_component_instance, delete_component_instance_by_id,
        component_instance_by_id, component_instances
    }
    "node" => Node(NodeData) {
        new_node, add_node, delete_node_by_id, node_by_id, nodes
    }
    "node type" => NodeType(NodeTypeData) {
        new_node_type, add_node_type, delete_node_type_by_id, node_type_by_id, node_types
    }
    "finding" => Finding(FindingData) {
        new_finding, add_finding, delete_finding_by_id, finding_by_id, findings
    }
    "finding type" => FindingType(FindingTypeData) {
        new_finding_type, add_finding_type, delete_finding_type_by_id, finding_type_by_id,
        finding_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::{EventError, EventResult};
    use crate::events::ListSink;

    fn model() -> (Arc<ListSink>, Model) {
        let sink = Arc::new(ListSink::new());
        let model = Model::new(sink.clone());
        (sink, model)
    }

    fn operations(sink: &ListSink) -> Vec<Operation> {
        sink.events().iter().map(|e| e.operation).collect()
    }

    /// Rejects every event.
    struct FailingSink;

    impl EventSink for FailingSink {
        fn receive(
            &self,
            _resource_type: ResourceType,
            _operation: Operation,
            _resource_id: ResourceId,
            _payload: &[Payload],
        ) -> EventResult<()> {
            Err(EventError::Serialization("refused".to_string()))
        }
    }

    #[test]
    fn test_context_lifecycle_events() {
        let (sink, model) = model();
        let id = ResourceId::new();
        let ctx = model.new_context(id);
        ctx.set_display_name("prod").unwrap();
        model.add_context(&ctx).unwrap();

        ctx.set_description("production").unwrap();
        ctx.annotations().add("owner", "ops").unwrap();
        model.add_context(&ctx).unwrap();
        model.delete_context_by_id(id).unwrap();

        assert_eq!(
            operations(&sink),
            vec![
                Operation::Create,
                Operation::Update,
                Operation::Update,
                Operation::Update,
                Operation::Delete
            ]
        );
        let events = sink.events();
        assert!(events.iter().all(|e| e.resource_type == ResourceType::Context));
        assert!(events.iter().all(|e| e.resource_id == id));
        assert!(events[4].payload.is_empty());
    }

    #[test]
    fn test_add_nil_id_is_rejected_without_event() {
        let (sink, model) = model();
        let node = model.new_node(ResourceId::nil());
        let err = model.add_node(&node).unwrap_err();
        assert!(matches!(err, ModelError::IdentityNotSet));
        assert!(sink.is_empty());
        assert!(!node.is_registered());
    }

    #[test]
    fn test_add_same_id_replaces_instance() {
        let (sink, model) = model();
        let id = ResourceId::new();
        let first = model.new_system(id);
        let second = model.new_system(id);
        model.add_system(&first).unwrap();
        model.add_system(&second).unwrap();

        assert_eq!(operations(&sink), vec![Operation::Create, Operation::Update]);
        let stored = model.system_by_id(id).unwrap();
        assert!(Arc::ptr_eq(&stored, &second));
        assert_eq!(model.systems().len(), 1);
    }

    #[test]
    fn test_create_payload_is_the_entity() {
        let (sink, model) = model();
        let api = model.new_api(ResourceId::new());
        model.add_api(&api).unwrap();

        let events = sink.events();
        let payload = events[0].payload[0].as_resource().unwrap();
        let resolved = payload.downcast_ref::<ApiData>().unwrap();
        assert!(std::ptr::eq(resolved, api.as_ref()));
    }

    #[test]
    fn test_delete_missing_reports_kind() {
        let (sink, model) = model();
        let err = model.delete_component_by_id(ResourceId::new()).unwrap_err();
        assert!(err.is_not_found_for(ResourceType::Component));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_delete_keeps_registration_flag() {
        let (_sink, model) = model();
        let finding = model.new_finding(ResourceId::new());
        model.add_finding(&finding).unwrap();
        model.delete_finding_by_id(finding.id()).unwrap();
        assert!(finding.is_registered());
        assert!(model.finding_by_id(finding.id()).is_none());
    }

    #[test]
    fn test_mismatched_model_is_rejected() {
        let (_a_sink, a) = model();
        let (b_sink, b) = model();
        let ctx = a.new_context(ResourceId::new());
        let err = b.add_context(&ctx).unwrap_err();
        assert!(matches!(err, ModelError::ModelMismatch { id } if id == ctx.id()));
        assert!(b_sink.is_empty());
    }

    #[test]
    fn test_sink_failure_leaves_store_unchanged() {
        let model = Model::new(Arc::new(FailingSink));
        let ctx = model.new_context(ResourceId::new());
        let err = model.add_context(&ctx).unwrap_err();
        assert!(err.is_event());
        assert!(model.context_by_id(ctx.id()).is_none());
        assert!(!ctx.is_registered());
        assert!(model
            .delete_context_by_id(ctx.id())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_list_snapshot_invalidated_on_write() {
        let (_sink, model) = model();
        let a = model.new_node_type(ResourceId::new());
        model.add_node_type(&a).unwrap();
        assert_eq!(model.node_types().len(), 1);
        assert!(model.core.state.read().node_types.has_snapshot());

        let b = model.new_node_type(ResourceId::new());
        model.add_node_type(&b).unwrap();
        assert!(!model.core.state.read().node_types.has_snapshot());
        assert_eq!(model.node_types().len(), 2);

        // a failed delete is not a write
        let _ = model.delete_node_type_by_id(ResourceId::new());
        assert!(model.core.state.read().node_types.has_snapshot());

        model.delete_node_type_by_id(a.id()).unwrap();
        assert_eq!(model.node_types().len(), 1);
    }

    #[test]
    fn test_len_of() {
        let (_sink, model) = model();
        model.add_node(&model.new_node(ResourceId::new())).unwrap();
        model.add_node(&model.new_node(ResourceId::new())).unwrap();
        model
            .add_finding_type(&model.new_finding_type(ResourceId::new()))
            .unwrap();
        assert_eq!(model.len_of(ResourceType::Node), 2);
        assert_eq!(model.len_of(ResourceType::FindingType), 1);
        assert_eq!(model.len_of(ResourceType::Annotations), 0);
    }

    #[test]
    fn test_entity_sink_rejects_foreign_resource_types() {
        let (_sink, model) = model();
        let ctx = model.new_context(ResourceId::new());
        let err = ctx
            .receive(ResourceType::System, Operation::Create, ResourceId::new(), &[])
            .unwrap_err();
        assert!(matches!(
            err,
            EventError::UnsupportedResourceType {
                sink: "Context",
                resource_type: ResourceType::System
            }
        ));
    }

    #[test]
    fn test_annotations_on_unregistered_entity_are_silent() {
        let (sink, model) = model();
        let system = model.new_system(ResourceId::new());
        system.annotations().add("k", "v").unwrap();
        system.annotations().delete("k").unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_annotation_change_becomes_entity_update() {
        let (sink, model) = model();
        let system = model.new_system(ResourceId::new());
        model.add_system(&system).unwrap();

        system.annotations().add("k", "v").unwrap();
        system.annotations().add("k", "v").unwrap();
        system.annotations().delete("k").unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 3);
        for event in &events[1..] {
            assert_eq!(event.resource_type, ResourceType::System);
            assert_eq!(event.operation, Operation::Update);
            assert_eq!(event.resource_id, system.id());
        }
    }

    #[test]
    fn test_sink_may_read_model_during_delivery() {
        struct Reader {
            model: parking_lot::Mutex<Option<Model>>,
            seen: parking_lot::Mutex<Vec<usize>>,
        }

        impl EventSink for Reader {
            fn receive(
                &self,
                resource_type: ResourceType,
                _operation: Operation,
                _resource_id: ResourceId,
                _payload: &[Payload],
            ) -> EventResult<()> {
                if let Some(model) = self.model.lock().as_ref() {
                    self.seen.lock().push(model.len_of(resource_type));
                }
                Ok(())
            }
        }

        let reader = Arc::new(Reader {
            model: parking_lot::Mutex::new(None),
            seen: parking_lot::Mutex::new(Vec::new()),
        });
        let model = Model::new(reader.clone());
        *reader.model.lock() = Some(model.clone());

        let ctx = model.new_context(ResourceId::new());
        model.add_context(&ctx).unwrap();
        ctx.set_display_name("x").unwrap();

        assert_eq!(*reader.seen.lock(), vec![1, 1]);
        // break the cycle
        reader.model.lock().take();
    }
}
