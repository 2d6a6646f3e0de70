//! seatgrid-dispatcher — the seat-pooling scheduler.
//!
//! One dispatcher serves one spec. Arriving proxies claim a free seat
//! immediately when possible; otherwise they park a pending claim, announce
//! themselves to the scaler, and wait in a bounded loop driven by three-way
//! wait outcomes (completed / cancelled / timed-out). Every wake-up is a
//! hint: the claim is always re-attempted, and cancellation is detected both
//! through the claim signal and by polling the proxy store.
//!
//! # Architecture
//!
//! ```text
//! ProxySharingDispatcher (per spec)
//!   ├── SeatStore (claim / release, linearizable)
//!   ├── DelegateProxyStore (delegate id → endpoints)
//!   ├── ProxyStore (cancellation polling)
//!   ├── PendingClaimTable (proxy id → waiter handle, write-TTL)
//!   ├── EventBus (PendingProxy / SeatAvailable / SeatClaimed / SeatReleased)
//!   └── SeatWaitMetrics (optional wait-latency histogram)
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod pending;

pub use config::{ProxyConfig, SharingConfig};
pub use dispatcher::{ProxyDispatcher, ProxySharingDispatcher};
pub use error::{DispatchError, DispatchResult};
pub use pending::{ClaimOutcome, PendingClaim, PendingClaimTable};
