//! Error types for modelsrv.
//!
//! All errors are strongly typed using thiserror and returned as values;
//! nothing in this crate is fatal to the process. The taxonomy follows the
//! layers of the crate: the ring buffer reports capacity errors, the event
//! layer reports protocol/serialization/subscription errors, and the model
//! store reports identity errors.

use thiserror::Error;

use crate::events::ResourceType;
use crate::identity::ResourceId;

/// Capacity errors raised by [`crate::queue::CircularQueue`].
///
/// Always recoverable: retry later, drop the item, or grow the capacity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Circular queue is full (capacity {capacity})")]
    Full {
        capacity: usize,
    },

    #[error("Circular queue is empty")]
    Empty,
}

/// Errors raised while delivering, rendering, or forwarding change events.
#[derive(Debug, Error)]
pub enum EventError {
    /// A sink received a resource type it does not handle. Indicates a
    /// caller bug; do not retry.
    #[error("Unsupported resource type {resource_type} in {sink} event sink")]
    UnsupportedResourceType {
        sink: &'static str,
        resource_type: ResourceType,
    },

    #[error("Unsupported payload kind: {kind}")]
    UnsupportedPayload {
        kind: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Subscriber {url} not found")]
    SubscriberNotFound {
        url: String,
    },

    #[error("Delivery to {url} failed: {reason}")]
    Delivery {
        url: String,
        reason: String,
    },
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl EventError {
    /// Returns true if the same call may succeed later without any change
    /// on the caller's side.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Queue(QueueError::Full { .. }) | Self::Delivery { .. }
        )
    }
}

/// Errors raised by the model store and its reference entities.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Resource identifier UUID not set")]
    IdentityNotSet,

    /// One distinguishable not-found error per entity kind, keyed by
    /// `resource_type`.
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: ResourceType,
        id: ResourceId,
    },

    #[error("Resource {id} was created for a different model")]
    ModelMismatch {
        id: ResourceId,
    },

    #[error("Owning model has been dropped")]
    ModelDropped,

    #[error("Event error: {0}")]
    Event(#[from] EventError),
}

impl ModelError {
    /// Creates a not-found error for the given kind.
    #[must_use]
    pub const fn not_found(resource_type: ResourceType, id: ResourceId) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// Returns true if this is a not-found error (of any kind).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a not-found error for the given kind.
    #[must_use]
    pub fn is_not_found_for(&self, kind: ResourceType) -> bool {
        matches!(self, Self::NotFound { resource_type, .. } if *resource_type == kind)
    }

    /// Returns true if this error came from the event layer.
    #[must_use]
    pub const fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Event(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias for event layer operations.
pub type EventResult<T> = Result<T, EventError>;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
