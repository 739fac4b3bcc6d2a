//! # homewatch-app
//!
//! Application layer — the event-driven coordination core and its **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Store` / `StoreTransaction` — scoped, transactional persistence
//!   - `SnapshotSource` — full current state per topic for new subscribers
//! - Provide the **event bus**: a bounded, non-blocking, multi-producer queue
//!   drained by a single consumer
//! - Provide the **dispatch loop** that routes each event to its persistence
//!   handlers and then to every registered plugin
//! - Provide the **persistence handlers** (log, value, alarm, command)
//! - Provide the **broadcast hub** fanning out snapshots and deltas to live
//!   subscribers per topic
//! - Provide the **plugin contract** and registry, the **ticker**, the shared
//!   **shutdown** signal and the **runtime** supervisor tying them together
//!
//! ## Dependency rule
//! Depends on `homewatch-domain` only (plus `tokio` for channels, timers and
//! task spawning). Never imports adapter crates. Adapters depend on *this*
//! crate, not the reverse.

pub mod broadcast_hub;
pub mod dispatcher;
pub mod event_bus;
pub mod handlers;
pub mod ingest;
pub mod plugin;
pub mod ports;
pub mod runtime;
pub mod shutdown;
pub mod snapshots;
pub mod ticker;

#[cfg(test)]
pub(crate) mod testing;
