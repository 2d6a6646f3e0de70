//! seatgrid-events — in-process typed event fan-out.
//!
//! Couples the dispatcher, the seat store and the scaler without direct
//! references. Delivery is best-effort: publishing with no subscribers is
//! fine, and a lagging subscriber loses the oldest events. Consumers must
//! treat every event as a hint and re-check the authoritative stores.

use seatgrid_model::{ProxyId, ProxyStopReason, SeatId, SpecId};
use tokio::sync::broadcast;
use tracing::debug;

/// Events exchanged between the dispatcher, seat store and scaler.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Dispatcher → scaler: a proxy is waiting for a seat.
    PendingProxy { spec_id: SpecId, proxy_id: ProxyId },
    /// Scaler / seat store → dispatchers: a seat just appeared.
    ///
    /// With an intended proxy id only that waiter is woken; without one,
    /// waiters recover through their per-attempt re-claims.
    SeatAvailable {
        spec_id: SpecId,
        intended_proxy_id: Option<ProxyId>,
    },
    /// Observability: a proxy claimed a seat.
    SeatClaimed { spec_id: SpecId, proxy_id: ProxyId },
    /// Observability: a seat was released.
    SeatReleased {
        spec_id: SpecId,
        seat_id: SeatId,
        proxy_id: ProxyId,
        reason: ProxyStopReason,
    },
}

/// Broadcast-backed publish/subscribe bus.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Capacity bounds how far a slow subscriber may lag before it starts
    /// losing events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers. Best-effort: an empty
    /// subscriber set is not an error.
    pub fn publish(&self, event: Event) {
        if self.tx.send(event.clone()).is_err() {
            debug!(?event, "event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
