//! Forwarding sink: renders events and buffers them for an external
//! dispatcher.
//!
//! Payloads are rendered to JSON at receive time, so the queued event is a
//! snapshot that stays valid however the entity changes afterwards.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ForwarderConfig;
use crate::error::{EventError, EventResult, QueueError};
use crate::identity::ResourceId;
use crate::model::AnyResource;
use crate::queue::CircularQueue;

use super::sink::EventSink;
use super::types::{Operation, Payload, ResourceType};

/// Wire shape of one annotation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDto {
    pub key: String,
    pub value: String,
}

/// Wire shape of a reference entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDto {
    pub id: ResourceId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered by key.
    pub annotations: Vec<AnnotationDto>,
}

impl ResourceDto {
    /// Snapshots a resource.
    #[must_use]
    pub fn from_resource(resource: &dyn AnyResource) -> Self {
        let description = resource.resource_description();
        Self {
            id: resource.resource_id(),
            display_name: resource.resource_display_name(),
            description: (!description.is_empty()).then_some(description),
            annotations: resource
                .annotation_pairs()
                .into_iter()
                .map(|(key, value)| AnnotationDto { key, value })
                .collect(),
        }
    }
}

/// An event as queued for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardedEvent {
    pub resource_type: ResourceType,
    pub operation: Operation,
    pub resource_id: ResourceId,
    pub objects_json: Vec<String>,
}

fn render_payload(payload: &Payload) -> EventResult<String> {
    match payload {
        Payload::Text(s) | Payload::AnnotationKey(s) => Ok(s.clone()),
        Payload::Annotation { key, value } => Ok(serde_json::to_string(&AnnotationDto {
            key: key.clone(),
            value: value.clone(),
        })?),
        Payload::Resource(r) => Ok(serde_json::to_string(&ResourceDto::from_resource(
            r.as_ref(),
        ))?),
        Payload::Opaque(_) => Err(EventError::UnsupportedPayload {
            kind: payload.kind().to_string(),
        }),
    }
}

/// Sink that serializes events onto a bounded queue.
///
/// A full queue is reported back to the emitter as
/// `EventError::Queue(QueueError::Full)`; nothing is dropped silently.
#[derive(Debug)]
pub struct EventForwarder {
    queue: Mutex<CircularQueue<ForwardedEvent>>,
}

impl EventForwarder {
    #[must_use]
    pub fn new(cfg: &ForwarderConfig) -> Self {
        Self {
            queue: Mutex::new(CircularQueue::new(cfg.queue_capacity)),
        }
    }

    /// Convenience for sharing one forwarder between a model and a
    /// dispatcher.
    #[must_use]
    pub fn shared(cfg: &ForwarderConfig) -> Arc<Self> {
        Arc::new(Self::new(cfg))
    }

    /// Removes the oldest pending event.
    ///
    /// # Errors
    ///
    /// `QueueError::Empty` if nothing is pending.
    pub fn dequeue(&self) -> Result<ForwardedEvent, QueueError> {
        self.queue.lock().dequeue()
    }

    /// Hands an event back so it is the next one dequeued.
    ///
    /// # Errors
    ///
    /// `QueueError::Full` if producers filled the queue in the meantime.
    pub fn push_back(&self, event: ForwardedEvent) -> Result<(), QueueError> {
        self.queue.lock().push(event)
    }

    /// Clones the oldest pending event.
    ///
    /// # Errors
    ///
    /// `QueueError::Empty` if nothing is pending.
    pub fn peek(&self) -> Result<ForwardedEvent, QueueError> {
        self.queue.lock().peek().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue.lock().is_full()
    }
}

impl Default for EventForwarder {
    fn default() -> Self {
        Self::new(&ForwarderConfig::default())
    }
}

impl EventSink for EventForwarder {
    fn receive(
        &self,
        resource_type: ResourceType,
        operation: Operation,
        resource_id: ResourceId,
        payload: &[Payload],
    ) -> EventResult<()> {
        let objects_json = payload
            .iter()
            .map(render_payload)
            .collect::<EventResult<Vec<_>>>()?;

        self.queue.lock().enqueue(ForwardedEvent {
            resource_type,
            operation,
            resource_id,
            objects_json,
        })?;
        debug!(%resource_type, %operation, %resource_id, "event queued for forwarding");
        Ok(())
    }
}
