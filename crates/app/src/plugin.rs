//! Plugin contract and registry.
//!
//! Plugins observe events after the persistence handlers have run. They
//! never touch the store or the broadcast hub; the only way a plugin affects
//! the system is by enqueueing new events on the bus through the
//! [`EventSender`](crate::event_bus::EventSender) it was constructed with.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use homewatch_domain::error::HomewatchError;
use homewatch_domain::event::{Event, EventType};

/// A unit of business logic driven by bus events.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Identity used in logs.
    fn name(&self) -> &str;

    /// Pre-filter evaluated before [`trigger`](Self::trigger). Defaults to
    /// ticks only.
    fn can_handle(&self, event_type: EventType) -> bool {
        event_type == EventType::Cycle
    }

    /// React to an event.
    async fn trigger(&self, event: &Event) -> Result<(), HomewatchError>;
}

/// Static set of plugins, invoked in registration order.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. Only called while wiring, before the dispatch loop runs.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        tracing::info!(plugin = plugin.name(), "plugin registered");
        self.plugins.push(plugin);
    }

    /// Chainable form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.register(plugin);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Names of the registered plugins, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|plugin| plugin.name())
    }

    /// Offer `event` to every plugin whose filter accepts its type.
    ///
    /// Each invocation is isolated: an error or a panic is logged with the
    /// plugin's name and the remaining plugins still run. Returns the number
    /// of plugins that completed successfully.
    pub async fn dispatch(&self, event: &Event) -> usize {
        let mut succeeded = 0;
        for plugin in &self.plugins {
            if !plugin.can_handle(event.event_type) {
                continue;
            }
            match AssertUnwindSafe(plugin.trigger(event)).catch_unwind().await {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(err)) => {
                    tracing::warn!(
                        plugin = plugin.name(),
                        event_type = %event.event_type,
                        error = %err,
                        "plugin failed"
                    );
                }
                Err(panic) => {
                    tracing::error!(
                        plugin = plugin.name(),
                        event_type = %event.event_type,
                        panic = panic_message(panic.as_ref()),
                        "plugin panicked"
                    );
                }
            }
        }
        succeeded
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
