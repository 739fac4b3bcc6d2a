//! Dispatch loop — the single consumer of the event bus.
//!
//! For every dequeued event the loop runs each handler bound to its type,
//! in registration order, then offers the event to the plugin registry
//! whether or not a handler matched. Everything for one event finishes
//! before the next is dequeued, which gives all side effects a total order.
//!
//! State machine: `Stopped → Running → Stopping → Stopped`. The shutdown
//! flag is polled between events and at least once per poll interval while
//! idle. On stop, the bus is drained until empty or the grace period runs
//! out, then plugins receive a final `STOP`.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;

use homewatch_domain::event::{Event, EventType};

use crate::event_bus::{Dequeued, EventReceiver};
use crate::handlers::EventHandler;
use crate::plugin::{PluginRegistry, panic_message};
use crate::shutdown::Shutdown;

/// Default bound on how long the loop waits for an event before
/// re-checking the shutdown flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default time budget for draining the bus on shutdown.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Stopped,
    Running,
    Stopping,
}

/// Routes events to handlers and plugins.
pub struct Dispatcher {
    routes: HashMap<EventType, Vec<Arc<dyn EventHandler>>>,
    plugins: PluginRegistry,
    poll_interval: Duration,
    drain_grace: Duration,
    state: watch::Sender<DispatcherState>,
}

impl Dispatcher {
    /// Create a builder for constructing a [`Dispatcher`].
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Observe the loop's lifecycle state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<DispatcherState> {
        self.state.subscribe()
    }

    /// Number of handlers bound to `event_type`.
    #[must_use]
    pub fn handler_count(&self, event_type: EventType) -> usize {
        self.routes.get(&event_type).map_or(0, Vec::len)
    }

    /// Run every matching handler, then the plugin fan-out, for one event.
    ///
    /// Failures and panics are logged per handler and never reach the
    /// caller or sibling handlers.
    pub async fn dispatch(&self, event: &Event) {
        tracing::debug!(event_type = %event.event_type, "dispatching");

        for handler in self.routes.get(&event.event_type).into_iter().flatten() {
            match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = %event.event_type,
                        error = ?err,
                        "handler failed"
                    );
                }
                Err(panic) => {
                    tracing::error!(
                        handler = handler.name(),
                        event_type = %event.event_type,
                        panic = panic_message(panic.as_ref()),
                        "handler panicked"
                    );
                }
            }
        }

        self.plugins.dispatch(event).await;
    }

    /// Drain `receiver` until `shutdown` fires or every producer is gone.
    pub async fn run(self, mut receiver: EventReceiver, shutdown: Shutdown) {
        self.state.send_replace(DispatcherState::Running);
        tracing::info!(
            plugins = self.plugins.len(),
            poll_interval = ?self.poll_interval,
            "dispatch loop running"
        );

        while !shutdown.is_triggered() {
            match receiver.dequeue(self.poll_interval).await {
                Dequeued::Event(event) => self.dispatch(&event).await,
                Dequeued::Idle => {}
                Dequeued::Closed => {
                    tracing::info!("every producer is gone, stopping");
                    break;
                }
            }
        }

        self.state.send_replace(DispatcherState::Stopping);
        self.drain(&mut receiver).await;

        self.plugins.dispatch(&Event::empty(EventType::Stop)).await;
        self.state.send_replace(DispatcherState::Stopped);
        tracing::info!("dispatch loop stopped");
    }

    async fn drain(&self, receiver: &mut EventReceiver) {
        let deadline = Instant::now() + self.drain_grace;
        let mut drained = 0_usize;
        while Instant::now() < deadline {
            let Some(event) = receiver.try_dequeue() else {
                tracing::info!(drained, "bus drained");
                return;
            };
            self.dispatch(&event).await;
            drained += 1;
        }
        let dropped = receiver.pending();
        if dropped > 0 {
            tracing::warn!(drained, dropped, "drain grace period elapsed, dropping remaining events");
        }
    }
}

/// Step-by-step builder for [`Dispatcher`]. The handler table is fixed once
/// built.
pub struct DispatcherBuilder {
    handlers: Vec<Arc<dyn EventHandler>>,
    plugins: PluginRegistry,
    poll_interval: Duration,
    drain_grace: Duration,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            plugins: PluginRegistry::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }
}

impl DispatcherBuilder {
    /// Bind a handler to every type it declares.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    #[must_use]
    pub fn plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Upper bound on idle waits, clamped to `1ms..=1s`.
    #[must_use]
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval =
            poll_interval.clamp(Duration::from_millis(1), Duration::from_secs(1));
        self
    }

    #[must_use]
    pub fn drain_grace(mut self, drain_grace: Duration) -> Self {
        self.drain_grace = drain_grace;
        self
    }

    #[must_use]
    pub fn build(self) -> Dispatcher {
        let mut routes: HashMap<EventType, Vec<Arc<dyn EventHandler>>> = HashMap::new();
        for handler in self.handlers {
            for event_type in handler.event_types() {
                tracing::debug!(handler = handler.name(), %event_type, "handler bound");
                routes
                    .entry(*event_type)
                    .or_default()
                    .push(Arc::clone(&handler));
            }
        }
        let (state, _) = watch::channel(DispatcherState::Stopped);
        Dispatcher {
            routes,
            plugins: self.plugins,
            poll_interval: self.poll_interval,
            drain_grace: self.drain_grace,
            state,
        }
    }
}
