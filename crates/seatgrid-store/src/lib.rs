//! seatgrid-store — shared-state registries behind trait seams.
//!
//! Three stores back the dispatcher:
//!
//! - [`SeatStore`] — seat inventory with linearizable claim/release
//! - [`DelegateProxyStore`] — registry of pre-warmed backend workloads
//! - [`ProxyStore`] — authoritative snapshots of user-facing proxies
//!
//! All mutating operations run in short critical sections and never await,
//! so callers may hold them inside async code freely.
//!
//! [`SessionRecovery`] rebuilds proxy snapshots from containers that
//! survived a restart, through the [`ContainerScanner`] contract.

pub mod delegate_store;
pub mod error;
pub mod proxy_store;
pub mod recovery;
pub mod seat_store;

pub use delegate_store::{DelegateProxyStore, MemoryDelegateProxyStore};
pub use error::{StoreError, StoreResult};
pub use proxy_store::{MemoryProxyStore, ProxyStore};
pub use recovery::{ContainerScanner, ExistingContainerInfo, SessionRecovery, SpecProvider};
pub use seat_store::{MemorySeatStore, SeatStore};
