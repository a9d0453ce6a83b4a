//! Sequence counter, subscriber registry, and sink vending.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{EventError, EventResult};

use super::sink::{EventSink, ListSink};

/// Builds the sink handed to a new model.
pub type SinkFactory = Box<dyn Fn() -> EventResult<Arc<dyn EventSink>> + Send + Sync>;

/// Owns the change sequence number and the webhook subscriber list.
///
/// The sequence number starts at 0 and only moves when a client asks for it
/// via [`increment_sequence_id`](Self::increment_sequence_id); long-poll
/// clients use it to ask "what changed since N".
pub struct EventManager {
    sequence: AtomicU64,
    subscribers: RwLock<Vec<String>>,
    sink_factory: RwLock<SinkFactory>,
}

impl EventManager {
    /// Creates a manager whose sink factory yields a fresh [`ListSink`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_sink_factory(Box::new(|| {
            let sink: Arc<dyn EventSink> = Arc::new(ListSink::new());
            Ok(sink)
        }))
    }

    /// Creates a manager with the given sink factory.
    #[must_use]
    pub fn with_sink_factory(factory: SinkFactory) -> Self {
        Self {
            sequence: AtomicU64::new(0),
            subscribers: RwLock::new(Vec::new()),
            sink_factory: RwLock::new(factory),
        }
    }

    #[must_use]
    pub fn current_sequence_id(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Advances the sequence number by one and returns the new value.
    pub fn increment_sequence_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Replaces the sink factory used by [`sink`](Self::sink).
    pub fn set_sink_factory(&self, factory: SinkFactory) {
        *self.sink_factory.write() = factory;
    }

    /// Builds a new sink with the configured factory.
    ///
    /// # Errors
    ///
    /// Whatever the factory returns.
    pub fn sink(&self) -> EventResult<Arc<dyn EventSink>> {
        let factory = self.sink_factory.read();
        (*factory)()
    }

    /// Current subscriber URLs, in registration order.
    #[must_use]
    pub fn subscribers(&self) -> Vec<String> {
        self.subscribers.read().clone()
    }

    /// Adds a subscriber. Adding a URL that is already present is a no-op.
    pub fn add_subscriber(&self, url: impl Into<String>) {
        let url = url.into();
        let mut subscribers = self.subscribers.write();
        if subscribers.contains(&url) {
            return;
        }
        debug!(%url, "subscriber added");
        subscribers.push(url);
    }

    /// Removes a subscriber. Linear in the number of subscribers.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SubscriberNotFound` if the URL was never added.
    pub fn remove_subscriber(&self, url: &str) -> EventResult<()> {
        let mut subscribers = self.subscribers.write();
        let Some(pos) = subscribers.iter().position(|s| s == url) else {
            return Err(EventError::SubscriberNotFound {
                url: url.to_string(),
            });
        };
        subscribers.remove(pos);
        debug!(%url, "subscriber removed");
        Ok(())
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("sequence", &self.current_sequence_id())
            .field("subscribers", &*self.subscribers.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use crate::events::DiscardSink;
    use crate::events::{Operation, ResourceType};
    use crate::identity::ResourceId;

    #[test]
    fn test_sequence_starts_at_zero_and_moves_on_request() {
        let manager = EventManager::new();
        assert_eq!(manager.current_sequence_id(), 0);
        assert_eq!(manager.current_sequence_id(), 0);
        assert_eq!(manager.increment_sequence_id(), 1);
        assert_eq!(manager.increment_sequence_id(), 2);
        assert_eq!(manager.current_sequence_id(), 2);
    }

    #[test]
    fn test_add_subscriber_is_idempotent() {
        let manager = EventManager::new();
        manager.add_subscriber("http://a");
        manager.add_subscriber("http://b");
        manager.add_subscriber("http://a");
        assert_eq!(manager.subscribers(), vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_remove_subscriber() {
        let manager = EventManager::new();
        manager.add_subscriber("http://a");
        manager.add_subscriber("http://b");
        manager.remove_subscriber("http://a").unwrap();
        assert_eq!(manager.subscribers(), vec!["http://b"]);

        let err = manager.remove_subscriber("http://a").unwrap_err();
        assert!(matches!(err, EventError::SubscriberNotFound { ref url } if url == "http://a"));
    }

    #[test]
    fn test_sink_uses_configured_factory() {
        let configured: Arc<dyn EventSink> = Arc::new(DiscardSink::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let manager = EventManager::new();
        let default_sink = manager.sink().unwrap();
        assert!(!Arc::ptr_eq(&default_sink, &configured));

        let factory_sink = Arc::clone(&configured);
        let factory_calls = Arc::clone(&calls);
        manager.set_sink_factory(Box::new(move || {
            factory_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::clone(&factory_sink))
        }));

        let a = manager.sink().unwrap();
        let b = manager.sink().unwrap();
        assert!(Arc::ptr_eq(&a, &configured));
        assert!(Arc::ptr_eq(&b, &configured));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        a.receive(ResourceType::Node, Operation::Create, ResourceId::new(), &[])
            .unwrap();
    }

    #[test]
    fn test_factory_errors_surface() {
        let manager = EventManager::with_sink_factory(Box::new(|| {
            Err(EventError::Serialization("no sink today".to_string()))
        }));
        assert!(manager.sink().is_err());
    }
}
