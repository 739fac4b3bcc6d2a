//! Shared application state for axum handlers.

use std::sync::Arc;

use homewatch_app::broadcast_hub::BroadcastHub;
use homewatch_app::event_bus::EventSender;
use homewatch_app::ports::Store;

/// Application state shared across all axum handlers.
///
/// Generic over the store type to avoid dynamic dispatch. `Clone` is
/// implemented manually so the store itself does not need to be `Clone` —
/// only the `Arc` wrappers are cloned.
pub struct AppState<S> {
    /// Read access for the JSON API.
    pub store: Arc<S>,
    /// Subscriber pools for the push channels.
    pub hub: Arc<BroadcastHub>,
    /// Producer handle for injected events.
    pub events: EventSender,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hub: Arc::clone(&self.hub),
            events: self.events.clone(),
        }
    }
}

impl<S> AppState<S>
where
    S: Store + 'static,
{
    /// Create a new application state.
    pub fn new(store: S, hub: Arc<BroadcastHub>, events: EventSender) -> Self {
        Self::from_arcs(Arc::new(store), hub, events)
    }

    /// Create a new application state from a pre-wrapped store.
    ///
    /// Use this when the store is also shared with the handlers on the
    /// dispatch loop.
    pub fn from_arcs(store: Arc<S>, hub: Arc<BroadcastHub>, events: EventSender) -> Self {
        Self { store, hub, events }
    }
}
