//! Change events and the sinks that consume them.
//!
//! A mutation travels up a chain of [`EventSink`]s: annotations report to
//! their owning entity, the entity re-emits an update on itself to the
//! model's sink, and that sink either discards, records, or forwards the
//! event onto a bounded queue for a [`Dispatcher`].

/// Webhook dispatch worker.
pub mod dispatcher;
/// Forwarding sink backed by the circular queue.
pub mod forwarder;
/// Sequence ids, subscribers, and sink vending.
pub mod manager;
/// The sink trait and in-process sinks.
pub mod sink;
/// Event vocabulary.
pub mod types;

pub use dispatcher::{Dispatcher, DispatcherHandle, WebhookTransport};
pub use forwarder::{AnnotationDto, EventForwarder, ForwardedEvent, ResourceDto};
pub use manager::{EventManager, SinkFactory};
pub use sink::{DiscardSink, EventSink, ListSink};
pub use types::{Event, Operation, Payload, ResourceType};
