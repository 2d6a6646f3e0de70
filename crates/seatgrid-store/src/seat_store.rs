//! Seat inventory with atomic claim and release.
//!
//! Free seats are handed out in FIFO order over their insertion into the
//! free list, so no free seat is starved under steady load. All operations
//! take one short-lived mutex; the free→claimed transition is linearizable
//! and a seat can never be double-claimed.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use seatgrid_events::{Event, EventBus};
use seatgrid_model::{Seat, SeatId, SpecId};
use tracing::debug;

/// Inventory of seats belonging to ready delegate workloads.
pub trait SeatStore: Send + Sync {
    /// Atomically claim any free seat for the given proxy.
    fn claim_seat(&self, claimant_proxy_id: &str) -> Option<Seat>;

    /// Release a seat. Idempotent; releasing a free or unknown seat is a
    /// no-op.
    fn release_seat(&self, seat_id: &str);

    fn get_seat(&self, seat_id: &str) -> Option<Seat>;

    fn num_unclaimed_seats(&self) -> u64;

    fn num_claimed_seats(&self) -> u64;

    /// Add a seat for a delegate that reported ready.
    fn add_seat(&self, seat: Seat);

    /// Drop every seat of a retired delegate, claimed or not. Returns how
    /// many were removed.
    fn remove_seats_for_delegate(&self, delegate_proxy_id: &str) -> u64;
}

struct SeatInner {
    seats: HashMap<SeatId, Seat>,
    /// Free seats in insertion order.
    free: VecDeque<SeatId>,
}

/// In-memory [`SeatStore`] for a single spec.
///
/// Releasing (and adding) a seat publishes an untargeted
/// [`Event::SeatAvailable`] so waiters are nudged to re-claim.
pub struct MemorySeatStore {
    spec_id: SpecId,
    bus: EventBus,
    inner: Mutex<SeatInner>,
}

impl MemorySeatStore {
    pub fn new(spec_id: impl Into<SpecId>, bus: EventBus) -> Self {
        Self {
            spec_id: spec_id.into(),
            bus,
            inner: Mutex::new(SeatInner {
                seats: HashMap::new(),
                free: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SeatInner> {
        self.inner.lock().expect("seat store lock poisoned")
    }
}

impl SeatStore for MemorySeatStore {
    fn claim_seat(&self, claimant_proxy_id: &str) -> Option<Seat> {
        let mut inner = self.lock();
        // Skip ids whose seat was removed with its delegate.
        while let Some(seat_id) = inner.free.pop_front() {
            if let Some(seat) = inner.seats.get_mut(&seat_id) {
                seat.claimant_proxy_id = Some(claimant_proxy_id.to_string());
                let seat = seat.clone();
                debug!(
                    seat_id = %seat.id,
                    proxy_id = %claimant_proxy_id,
                    delegate_proxy_id = %seat.delegate_proxy_id,
                    "seat claimed"
                );
                return Some(seat);
            }
        }
        None
    }

    fn release_seat(&self, seat_id: &str) {
        let released = {
            let mut inner = self.lock();
            let unclaimed = match inner.seats.get_mut(seat_id) {
                Some(seat) if seat.is_claimed() => {
                    seat.claimant_proxy_id = None;
                    true
                }
                _ => false,
            };
            if unclaimed {
                inner.free.push_back(seat_id.to_string());
            }
            unclaimed
        };

        if released {
            debug!(%seat_id, "seat released");
            self.bus.publish(Event::SeatAvailable {
                spec_id: self.spec_id.clone(),
                intended_proxy_id: None,
            });
        }
    }

    fn get_seat(&self, seat_id: &str) -> Option<Seat> {
        self.lock().seats.get(seat_id).cloned()
    }

    fn num_unclaimed_seats(&self) -> u64 {
        self.lock()
            .seats
            .values()
            .filter(|seat| !seat.is_claimed())
            .count() as u64
    }

    fn num_claimed_seats(&self) -> u64 {
        self.lock()
            .seats
            .values()
            .filter(|seat| seat.is_claimed())
            .count() as u64
    }

    fn add_seat(&self, seat: Seat) {
        {
            let mut inner = self.lock();
            if !seat.is_claimed() {
                inner.free.push_back(seat.id.clone());
            }
            inner.seats.insert(seat.id.clone(), seat);
        }
        self.bus.publish(Event::SeatAvailable {
            spec_id: self.spec_id.clone(),
            intended_proxy_id: None,
        });
    }

    fn remove_seats_for_delegate(&self, delegate_proxy_id: &str) -> u64 {
        let mut inner = self.lock();
        let doomed: Vec<SeatId> = inner
            .seats
            .values()
            .filter(|seat| seat.delegate_proxy_id == delegate_proxy_id)
            .map(|seat| seat.id.clone())
            .collect();
        for seat_id in &doomed {
            inner.seats.remove(seat_id);
        }
        inner.free.retain(|seat_id| !doomed.contains(seat_id));
        doomed.len() as u64
    }
}
