//! Event vocabulary: what changed, how, and the objects that came with it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identity::ResourceId;
use crate::model::AnyResource;

/// Kind of resource an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "UnknownResourceType")]
    Unknown,
    Node,
    NodeType,
    Context,
    ContextType,
    System,
    SystemInstance,
    #[serde(rename = "API")]
    Api,
    #[serde(rename = "APIInstance")]
    ApiInstance,
    Component,
    ComponentInstance,
    Finding,
    FindingType,
    /// Value object; events of this type carry the nil resource id.
    Annotations,
}

impl ResourceType {
    /// All variants, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Unknown,
        Self::Node,
        Self::NodeType,
        Self::Context,
        Self::ContextType,
        Self::System,
        Self::SystemInstance,
        Self::Api,
        Self::ApiInstance,
        Self::Component,
        Self::ComponentInstance,
        Self::Finding,
        Self::FindingType,
        Self::Annotations,
    ];

    /// Canonical name used in event text and forwarded events.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UnknownResourceType",
            Self::Node => "Node",
            Self::NodeType => "NodeType",
            Self::Context => "Context",
            Self::ContextType => "ContextType",
            Self::System => "System",
            Self::SystemInstance => "SystemInstance",
            Self::Api => "API",
            Self::ApiInstance => "APIInstance",
            Self::Component => "Component",
            Self::ComponentInstance => "ComponentInstance",
            Self::Finding => "Finding",
            Self::FindingType => "FindingType",
            Self::Annotations => "Annotations",
        }
    }

    /// Parses a canonical name; anything unrecognised maps to `Unknown`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "UnknownOperation")]
    Unknown,
    #[serde(rename = "CreateOperation")]
    Create,
    #[serde(rename = "UpdateOperation")]
    Update,
    #[serde(rename = "DeleteOperation")]
    Delete,
}

impl Operation {
    const ALL: [Self; 4] = [Self::Unknown, Self::Create, Self::Update, Self::Delete];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UnknownOperation",
            Self::Create => "CreateOperation",
            Self::Update => "UpdateOperation",
            Self::Delete => "DeleteOperation",
        }
    }

    /// Parses a canonical name; anything unrecognised maps to `Unknown`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An object attached to an event.
///
/// Sinks decide what they can do with each kind; the forwarding sink, for
/// example, rejects `Opaque` payloads because it cannot render them.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A reference entity, as it is at the time of the event.
    Resource(Arc<dyn AnyResource>),
    /// A single annotation entry that was created or changed.
    Annotation {
        key: String,
        value: String,
    },
    /// The key of a removed annotation.
    AnnotationKey(String),
    Text(String),
    /// Anything else. Only in-process sinks can make sense of it.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Payload {
    /// Short name of the payload kind, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Resource(_) => "resource",
            Self::Annotation { .. } => "annotation",
            Self::AnnotationKey(_) => "annotation_key",
            Self::Text(_) => "text",
            Self::Opaque(_) => "opaque",
        }
    }

    /// Returns the resource handle if this is a `Resource` payload.
    #[must_use]
    pub fn as_resource(&self) -> Option<&Arc<dyn AnyResource>> {
        match self {
            Self::Resource(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(r) => write!(
                f,
                "{} {} {:?}",
                r.resource_type(),
                r.resource_id(),
                r.resource_display_name()
            ),
            Self::Annotation { key, value } => write!(f, "{{{key}: {value}}}"),
            Self::AnnotationKey(key) | Self::Text(key) => f.write_str(key),
            Self::Opaque(_) => f.write_str("<opaque>"),
        }
    }
}

/// A recorded change event.
#[derive(Debug, Clone)]
pub struct Event {
    pub resource_type: ResourceType,
    pub operation: Operation,
    pub resource_id: ResourceId,
    pub payload: Vec<Payload>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.operation, self.resource_type, self.resource_id)?;
        if self.operation == Operation::Delete {
            return Ok(());
        }
        f.write_str(": [")?;
        for (i, p) in self.payload.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_names_round_trip() {
        for t in ResourceType::ALL {
            assert_eq!(ResourceType::parse(t.name()), t);
        }
        assert_eq!(ResourceType::parse("nonsense"), ResourceType::Unknown);
        assert_eq!(ResourceType::Api.to_string(), "API");
        assert_eq!(ResourceType::ApiInstance.to_string(), "APIInstance");
    }

    #[test]
    fn test_operation_parse() {
        assert_eq!(Operation::parse("CreateOperation"), Operation::Create);
        assert_eq!(Operation::parse("DeleteOperation"), Operation::Delete);
        assert_eq!(Operation::parse("Create"), Operation::Unknown);
    }

    #[test]
    fn test_serde_names_match_display() {
        let json = serde_json::to_string(&ResourceType::ApiInstance).unwrap();
        assert_eq!(json, "\"APIInstance\"");
        let json = serde_json::to_string(&Operation::Update).unwrap();
        assert_eq!(json, "\"UpdateOperation\"");
    }

    #[test]
    fn test_event_display() {
        let id = ResourceId::nil();
        let created = Event {
            resource_type: ResourceType::Annotations,
            operation: Operation::Create,
            resource_id: id,
            payload: vec![Payload::Annotation {
                key: "key1".to_string(),
                value: "value1".to_string(),
            }],
        };
        assert_eq!(
            created.to_string(),
            format!("CreateOperation: Annotations {id}: [{{key1: value1}}]")
        );

        let deleted = Event {
            resource_type: ResourceType::Annotations,
            operation: Operation::Delete,
            resource_id: id,
            payload: vec![Payload::AnnotationKey("key1".to_string())],
        };
        assert_eq!(deleted.to_string(), format!("DeleteOperation: Annotations {id}"));
    }

    #[test]
    fn test_payload_kind() {
        assert_eq!(Payload::Text("x".to_string()).kind(), "text");
        assert_eq!(Payload::Opaque(Arc::new(5u8)).kind(), "opaque");
        assert!(Payload::Text("x".to_string()).as_resource().is_none());
    }
}
