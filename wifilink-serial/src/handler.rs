//! Event handlers
//!
//! The channel forwards one [`SerialEvents`] set per driver notification to
//! the handler it was constructed with. Handlers run in interrupt context and
//! must not block.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

use crate::events::SerialEvents;

/// Receiver of forwarded serial events
pub trait EventHandler {
    /// Called once per driver notification
    ///
    /// The default implementation ignores the events.
    fn on_event(&self, events: SerialEvents) {
        let _ = events;
    }
}

/// Handler that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {}

impl<F> EventHandler for F
where
    F: Fn(SerialEvents),
{
    fn on_event(&self, events: SerialEvents) {
        self(events)
    }
}

/// Handler that hands events to an async task through a [`Signal`]
///
/// Events raised before the task picks them up are merged into the pending
/// set, so nothing is lost while the task is busy. Empty notifications are
/// not signalled.
pub struct SignalHandler<M: RawMutex> {
    signal: Signal<M, SerialEvents>,
}

impl<M: RawMutex> Default for SignalHandler<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> SignalHandler<M> {
    /// Create a handler with nothing pending
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Wait until at least one event is pending and take the pending set
    pub async fn wait(&self) -> SerialEvents {
        self.signal.wait().await
    }

    /// Take the pending set without waiting
    pub fn try_take(&self) -> Option<SerialEvents> {
        self.signal.try_take()
    }

    /// Whether events are pending
    pub fn signaled(&self) -> bool {
        self.signal.signaled()
    }
}

impl<M: RawMutex> EventHandler for SignalHandler<M> {
    fn on_event(&self, events: SerialEvents) {
        if events.is_empty() {
            return;
        }
        let pending = self.signal.try_take().unwrap_or_else(SerialEvents::empty);
        self.signal.signal(pending | events);
    }
}
