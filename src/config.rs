//! Configuration for the forwarding side of the event pipeline.
//!
//! The model store itself has no tunables; only the bounded forwarding
//! queue and the dispatcher that drains it do.

use std::time::Duration;

/// Settings for [`crate::events::EventForwarder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwarderConfig {
    /// Max queued events before the forwarder rejects with `QueueError::Full`.
    pub queue_capacity: usize,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

/// Settings for [`crate::events::Dispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Sleep between drain passes of the background worker.
    pub poll_interval: Duration,
    /// Max events delivered per `dispatch_pending` call.
    pub max_batch: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_batch: 256,
        }
    }
}
