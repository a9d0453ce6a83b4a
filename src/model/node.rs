//! Infrastructure nodes.

use crate::events::ResourceType;

use super::registry::{Registry, Stored};
use super::resource::{lazy_ref_accessors, link_ref, LazyRef, Resource, ResourceData};
use super::ModelState;

#[derive(Debug, Default)]
pub struct NodeData {
    node_type: Option<LazyRef<NodeTypeData>>,
}

/// A host, cluster or other piece of infrastructure.
pub type Node = Resource<NodeData>;

impl ResourceData for NodeData {
    const RESOURCE_TYPE: ResourceType = ResourceType::Node;
}

impl Stored for NodeData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.nodes
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.nodes
    }

    fn link(&mut self, state: &ModelState) {
        link_ref(&mut self.node_type, &state.node_types);
    }
}

impl Node {
    lazy_ref_accessors!(
        node_type: NodeType,
        node_type_id,
        set_node_type_by_id,
        set_node_type_by_ref
    );
}

#[derive(Debug, Default)]
pub struct NodeTypeData;

pub type NodeType = Resource<NodeTypeData>;

impl ResourceData for NodeTypeData {
    const RESOURCE_TYPE: ResourceType = ResourceType::NodeType;
}

impl Stored for NodeTypeData {
    fn registry(state: &ModelState) -> &Registry<Self> {
        &state.node_types
    }

    fn registry_mut(state: &mut ModelState) -> &mut Registry<Self> {
        &mut state.node_types
    }
}
