//! Drains the forwarding queue towards webhook subscribers.
//!
//! The transport is supplied by the caller; this module only owns the
//! ordering and retry rules. Delivery is at-least-once: an event leaves the
//! queue only after every subscriber accepted it, so one that fails stays at
//! the front and is offered again to every subscriber on the next pass. The
//! dispatcher must be the queue's only consumer.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use tracing::{debug, warn};

use crate::config::DispatcherConfig;
use crate::error::{EventError, EventResult, QueueError};

use super::forwarder::{EventForwarder, ForwardedEvent};
use super::manager::EventManager;

/// Delivers one event to one subscriber URL.
pub trait WebhookTransport: Send + Sync {
    /// # Errors
    ///
    /// A human readable reason; the dispatcher keeps the event queued.
    fn deliver(&self, url: &str, event: &ForwardedEvent) -> Result<(), String>;
}

/// Moves events from an [`EventForwarder`] to the subscribers registered in
/// an [`EventManager`].
pub struct Dispatcher {
    cfg: DispatcherConfig,
    forwarder: Arc<EventForwarder>,
    manager: Arc<EventManager>,
    transport: Arc<dyn WebhookTransport>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        cfg: DispatcherConfig,
        forwarder: Arc<EventForwarder>,
        manager: Arc<EventManager>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        Self {
            cfg,
            forwarder,
            manager,
            transport,
        }
    }

    /// Delivers up to `max_batch` pending events, oldest first.
    ///
    /// Each fully delivered event advances the manager's sequence id by one.
    /// Returns the number of events delivered.
    ///
    /// # Errors
    ///
    /// `EventError::Delivery` on the first failed delivery; the failed event
    /// is back at the front of the queue.
    pub fn dispatch_pending(&self) -> EventResult<usize> {
        let max_batch = self.cfg.max_batch.max(1);
        let mut delivered = 0;

        while delivered < max_batch {
            // Producers only append, so the peeked event is still at the
            // front when it is removed below.
            let event = match self.forwarder.peek() {
                Ok(event) => event,
                Err(QueueError::Empty) => break,
                Err(e) => return Err(e.into()),
            };

            if let Err((url, reason)) = self.deliver_to_all(&event) {
                warn!(%url, %reason, resource_id = %event.resource_id, "delivery failed, event kept at front");
                return Err(EventError::Delivery { url, reason });
            }
            self.forwarder.dequeue()?;

            let seq = self.manager.increment_sequence_id();
            debug!(sequence_id = seq, resource_id = %event.resource_id, "event delivered");
            delivered += 1;
        }

        Ok(delivered)
    }

    fn deliver_to_all(&self, event: &ForwardedEvent) -> Result<(), (String, String)> {
        for url in self.manager.subscribers() {
            self.transport
                .deliver(&url, event)
                .map_err(|reason| (url.clone(), reason))?;
        }
        Ok(())
    }

    /// Runs [`dispatch_pending`](Self::dispatch_pending) on a background
    /// thread every `poll_interval` until the handle is shut down.
    ///
    /// # Errors
    ///
    /// Fails if the worker thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<DispatcherHandle> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let join = thread::Builder::new()
            .name("modelsrv-dispatcher".to_string())
            .spawn(move || worker_loop(self, shutdown_rx))?;

        Ok(DispatcherHandle {
            shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop(dispatcher: Dispatcher, shutdown_rx: Receiver<()>) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => break,
            default(dispatcher.cfg.poll_interval) => {
                if let Err(e) = dispatcher.dispatch_pending() {
                    debug!(error = %e, "dispatch pass ended early");
                }
            }
        }
    }
}

/// Handle to a running dispatcher worker.
///
/// Dropping the handle signals the worker to stop without waiting for it.
#[derive(Debug)]
pub struct DispatcherHandle {
    shutdown_tx: Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Stops the worker and waits for the current pass to finish.
    pub fn shutdown(mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("dispatcher worker panicked");
            }
        }
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        // Detach; the worker exits on the signal or once the sender is gone.
        let _ = self.shutdown_tx.try_send(());
    }
}
