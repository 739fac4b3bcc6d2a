//! Runtime supervisor — owns the ticker and dispatch loop tasks.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use homewatch_domain::event::{Event, EventType};

use crate::dispatcher::{Dispatcher, DispatcherState};
use crate::event_bus::{EventReceiver, EventSender};
use crate::shutdown::{self, ShutdownTrigger};
use crate::ticker::Ticker;

/// Handle to the running coordination core.
#[derive(Debug)]
pub struct Runtime {
    trigger: ShutdownTrigger,
    ticker: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
    state: watch::Receiver<DispatcherState>,
}

impl Runtime {
    /// Enqueue `START`, then spawn the dispatch loop and the ticker.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(
        dispatcher: Dispatcher,
        receiver: EventReceiver,
        ticker: Ticker,
        events: &EventSender,
    ) -> Self {
        let (trigger, shutdown) = shutdown::signal();
        let state = dispatcher.state();

        // START goes in ahead of the first CYCLE.
        let _ = events.enqueue(Event::empty(EventType::Start));

        let dispatcher = tokio::spawn(dispatcher.run(receiver, shutdown.clone()));
        let ticker = tokio::spawn(ticker.run(shutdown));
        tracing::info!("runtime started");

        Self {
            trigger,
            ticker,
            dispatcher,
            state,
        }
    }

    /// Observe the dispatch loop's lifecycle state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<DispatcherState> {
        self.state.clone()
    }

    /// Signal stop and wait for both tasks to reach their terminal state.
    pub async fn shutdown(self) {
        tracing::info!("runtime shutting down");
        self.trigger.trigger();

        if let Err(err) = self.ticker.await {
            tracing::error!(%err, "ticker task ended abnormally");
        }
        if let Err(err) = self.dispatcher.await {
            tracing::error!(%err, "dispatch task ended abnormally");
        }
        tracing::info!("runtime stopped");
    }
}
