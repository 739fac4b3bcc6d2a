//! # homewatch-domain
//!
//! Pure domain model for the homewatch telemetry monitor.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Events** (typed messages travelling on the event bus) and
//!   their per-type payloads
//! - Define the persisted entities: **Log entries**, **Value readings**,
//!   **Alarms**
//! - Define **Topics** and the push/client wire messages exchanged with live
//!   subscribers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod alarm;
pub mod event;
pub mod log_entry;
pub mod message;
pub mod topic;
pub mod value;
