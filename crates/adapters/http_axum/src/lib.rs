//! # homewatch-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the three **push channels** as WebSockets (`/dashboard/ws`,
//!   `/protocol/ws`, `/alarm/ws`): each connection subscribes to the
//!   broadcast hub, receives its topic's snapshot first and then every
//!   update; acknowledgements sent on the alarm channel go onto the bus
//! - Serve a **JSON read API** over the store (`/api/values`,
//!   `/api/alarms`, `/api/logs`)
//! - Accept **event injection** (`POST /api/events`) for externally
//!   producible event types
//!
//! ## Dependency rule
//! Depends on `homewatch-app` (for port traits, the hub and the bus) and
//! `homewatch-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
pub mod ws;
