//! Persistence handlers bound to event types.
//!
//! A handler runs on the dispatch loop. It parses its payload, opens one
//! store transaction per unit of work, commits, and only then publishes to
//! the broadcast hub, so no transaction is ever held across a delivery.
//! Derived events go back on the bus through a non-blocking enqueue.

mod alarm;
mod command;
mod log;
mod value;

use async_trait::async_trait;

use homewatch_domain::error::HomewatchError;
use homewatch_domain::event::{Event, EventType};

pub use alarm::{ALARM_LIST_LIMIT, AlarmHandler};
pub use command::{ACKNOWLEDGE_ALARM, CommandHandler};
pub use log::LogHandler;
pub use value::ValueHandler;

/// A unit of work bound to one or more event types.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Identity used in logs.
    fn name(&self) -> &'static str;

    /// Event types this handler is registered for.
    fn event_types(&self) -> &'static [EventType];

    /// Process one event.
    async fn handle(&self, event: &Event) -> Result<(), HomewatchError>;
}
