//! # modelsrv - In-memory architecture landscape model
//!
//! modelsrv keeps an in-memory registry of the entities that make up a
//! software landscape (systems, APIs, components, their running instances,
//! the contexts and nodes they run in, and findings about them) and reports
//! every change as a structured event.
//!
//! ## Core Concepts
//!
//! - **Model**: owns one registry per entity kind and serializes mutations
//! - **Resource**: a reference entity with a UUID identity, display name,
//!   description, annotations and kind-specific data
//! - **Event sink**: receives `(resource type, operation, id, payload)` for
//!   every effective change
//! - **Forwarder**: a sink that renders events to JSON into a bounded queue
//!   for webhook subscribers
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use modelsrv::events::{ListSink, Operation};
//! use modelsrv::{Model, ResourceId};
//!
//! let sink = Arc::new(ListSink::new());
//! let model = Model::new(sink.clone());
//!
//! let system = model.new_system(ResourceId::new());
//! system.set_display_name("billing")?;
//! model.add_system(&system)?;
//! system.annotations().add("owner", "team-payments")?;
//!
//! let ops: Vec<Operation> = sink.events().iter().map(|e| e.operation).collect();
//! assert_eq!(ops, vec![Operation::Create, Operation::Update]);
//! # Ok::<(), modelsrv::ModelError>(())
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod model;
pub mod queue;

pub use config::{DispatcherConfig, ForwarderConfig};
pub use error::{EventError, EventResult, ModelError, ModelResult, QueueError};
pub use events::{Event, EventSink, Operation, Payload, ResourceType};
pub use identity::ResourceId;
pub use model::{
    AnyResource, Annotations, Api, ApiInstance, ApiType, Component, ComponentInstance, Context,
    ContextType, Finding, FindingType, Model, Node, NodeType, RegistrationState, Resource,
    ResourceRef, System, SystemInstance, Version,
};
pub use queue::CircularQueue;
