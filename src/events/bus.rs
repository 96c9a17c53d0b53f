//! # Event bus for pool events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]: the orchestrator and every supervision
//! loop publish into it, while [`Orchestrator::subscribe`](crate::Orchestrator::subscribe)
//! callers and the internal subscriber listener read from it.
//!
//! ```text
//!   scale()/terminate() ──┐
//!   supervision loop 1 ───┼──► Bus ──┬──► subscriber listener ──► SubscriberSet
//!   supervision loop N ───┘          └──► Orchestrator::subscribe() receivers
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; without receivers the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers.
//! - Lagging receivers get `RecvError::Lagged(n)` and skip the `n` oldest events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for pool events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_receivers_get_events_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::Scaled));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::Terminated));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Terminated);
    }
}
