//! The event sink capability and the in-process sinks.

use parking_lot::Mutex;

use crate::error::EventResult;
use crate::identity::ResourceId;

use super::types::{Event, Operation, Payload, ResourceType};

/// A consumer of change events.
///
/// The model store, every reference entity, and every forwarding stage
/// implement this one method, which lets a change bubble from a value object
/// to its owner and from the owner to the store's configured sink.
pub trait EventSink: Send + Sync {
    /// Accepts one event.
    ///
    /// # Errors
    ///
    /// Implementation specific; the error is surfaced to whoever caused
    /// the event.
    fn receive(
        &self,
        resource_type: ResourceType,
        operation: Operation,
        resource_id: ResourceId,
        payload: &[Payload],
    ) -> EventResult<()>;
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl DiscardSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventSink for DiscardSink {
    fn receive(
        &self,
        _resource_type: ResourceType,
        _operation: Operation,
        _resource_id: ResourceId,
        _payload: &[Payload],
    ) -> EventResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Recorded {
    texts: Vec<String>,
    events: Vec<Event>,
}

/// Sink that records every event, as text and as a structured copy.
///
/// Unbounded; meant for tests and inspection.
#[derive(Debug, Default)]
pub struct ListSink {
    recorded: Mutex<Recorded>,
}

impl ListSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text renderings of the recorded events, oldest first.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.recorded.lock().texts.clone()
    }

    /// Structured copies of the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.recorded.lock().events.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recorded.lock().events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut recorded = self.recorded.lock();
        recorded.texts.clear();
        recorded.events.clear();
    }

    /// Writes every recorded line to stdout.
    pub fn print(&self) {
        for line in &self.recorded.lock().texts {
            println!("{line}");
        }
    }
}

impl EventSink for ListSink {
    fn receive(
        &self,
        resource_type: ResourceType,
        operation: Operation,
        resource_id: ResourceId,
        payload: &[Payload],
    ) -> EventResult<()> {
        let event = Event {
            resource_type,
            operation,
            resource_id,
            payload: payload.to_vec(),
        };
        // render before taking the lock; rendering reads the payload entities
        let text = event.to_string();

        let mut recorded = self.recorded.lock();
        recorded.texts.push(text);
        recorded.events.push(event);
        Ok(())
    }
}
