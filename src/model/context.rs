//! Contexts: the organizational or runtime scopes systems are deployed into.

use crate::events::ResourceType;

use super::registry::{Registry, Stored};
use super::resource::{lazy_ref_accessors, link_ref, LazyRef, Resource, ResourceData};
use super::ModelState;

#[derive(Debug, Default)]
pub struct ContextData {
    parent: Option<LazyRef<ContextData>>,
    context_type: Option<LazyRef<ContextTypeData>>,
}

/// A deployment or organizational scope. Contexts nest via `parent`.
pub type Context = Resource<ContextData>;

impl ResourceData for ContextData {
    const RESOURCE_TYPE: ResourceType = ResourceType::Context;
}

impl Stored for ContextData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.contexts
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.contexts
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.parent, &state.contexts);
        link_ref(&mut self.context_type, &state.context_types);
    }
}

impl Context {
    lazy_ref_accessors!(parent: Context, parent_id, set_parent_by_id, set_parent_by_ref);
    lazy_ref_accessors!(
        context_type: ContextType,
        context_type_id,
        set_context_type_by_id,
        set_context_type_by_ref
    );
}

#[derive(Debug, Default)]
pub struct ContextTypeData;

/// Classifier for contexts, e.g. "environment" or "region".
pub type ContextType = Resource<ContextTypeData>;

impl ResourceData for ContextTypeData {
    const RESOURCE_TYPE: ResourceType = ResourceType::ContextType;
}

impl Stored for ContextTypeData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.context_types
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.context_types
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::events::{ListSink, Operation};
    use crate::identity::ResourceId;
    use crate::model::Model;

    fn model() -> (Arc<ListSink>, Model) {
        let sink = Arc::new(ListSink::new());
        let model = Model::new(sink.clone());
        (sink, model)
    }

    #[test]
    fn test_parent_by_id_resolves_lazily_to_stored_instance() {
        let (_sink, model) = model();
        let root = model.new_context(ResourceId::new());
        let child = model.new_context(ResourceId::new());

        child.set_parent_by_id(root.id()).unwrap();
        assert_eq!(child.parent_id(), Some(root.id()));
        assert!(child.parent().unwrap_err().is_not_found());

        model.add_context(&root).unwrap();
        let parent = child.parent().unwrap().unwrap();
        assert!(Arc::ptr_eq(&parent, &root));
    }

    #[test]
    fn test_parent_by_ref_needs_no_lookup() {
        let (_sink, model) = model();
        let root = model.new_context(ResourceId::new());
        let child = model.new_context(ResourceId::new());

        child.set_parent_by_ref(&root).unwrap();
        // root was never added, yet the reference is already resolved
        assert!(Arc::ptr_eq(&child.parent().unwrap().unwrap(), &root));
    }

    #[test]
    fn test_unset_reference_is_none() {
        let (_sink, model) = model();
        let ctx = model.new_context(ResourceId::new());
        assert!(ctx.parent().unwrap().is_none());
        assert!(ctx.context_type().unwrap().is_none());
        assert_eq!(ctx.context_type_id(), None);
    }

    #[test]
    fn test_dangling_context_type_reports_its_kind() {
        let (_sink, model) = model();
        let ctx = model.new_context(ResourceId::new());
        ctx.set_context_type_by_id(ResourceId::new()).unwrap();
        let err = ctx.context_type().unwrap_err();
        assert!(err.is_not_found_for(crate::events::ResourceType::ContextType));
    }

    #[test]
    fn test_setting_reference_on_registered_context_emits_update() {
        let (sink, model) = model();
        let ctx = model.new_context(ResourceId::new());
        model.add_context(&ctx).unwrap();

        let ctx_type = model.new_context_type(ResourceId::new());
        ctx.set_context_type_by_ref(&ctx_type).unwrap();

        let ops: Vec<Operation> = sink.events().iter().map(|e| e.operation).collect();
        assert_eq!(ops, vec![Operation::Create, Operation::Update]);
    }
}
