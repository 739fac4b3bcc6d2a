//! In-process event bus backed by a bounded tokio [`mpsc`] channel.
//!
//! Any number of producers (ticker, plugins, handlers, inbound connections)
//! hold a cloned [`EventSender`]; exactly one [`EventReceiver`] is drained by
//! the dispatch loop. Enqueueing never waits: when the bus is at capacity
//! the event is dropped with a warning. Handlers running on the consumer
//! therefore cannot deadlock against their own bus.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use homewatch_domain::error::BusError;
use homewatch_domain::event::Event;

/// Default number of events the bus buffers before dropping.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Create a bus with the given capacity.
#[must_use]
pub fn channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer handle. Cheap to clone and safe to use from any task.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    /// Enqueue an event without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Full`] when the bus is at capacity and
    /// [`BusError::Closed`] once the consumer is gone. In both cases the
    /// event is dropped and a warning is logged.
    pub fn enqueue(&self, event: Event) -> Result<(), BusError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                tracing::warn!(event_type = %event.event_type, "event bus full, dropping event");
                Err(BusError::Full)
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(event_type = %event.event_type, "event bus closed, dropping event");
                Err(BusError::Closed)
            }
        }
    }
}

/// Outcome of a bounded wait on the bus.
#[derive(Debug)]
pub enum Dequeued {
    Event(Event),
    /// Nothing arrived before the timeout.
    Idle,
    /// Every producer is gone.
    Closed,
}

/// Consumer handle, owned by the dispatch loop.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<Event>,
}

impl EventReceiver {
    /// Wait at most `timeout` for the next event.
    pub async fn dequeue(&mut self, timeout: Duration) -> Dequeued {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(event)) => Dequeued::Event(event),
            Ok(None) => Dequeued::Closed,
            Err(_) => Dequeued::Idle,
        }
    }

    /// Take the next buffered event, if any, without waiting.
    pub fn try_dequeue(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Number of events currently buffered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
