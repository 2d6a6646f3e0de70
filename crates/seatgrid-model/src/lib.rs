//! seatgrid-model — domain types for seat-pooled session proxying.
//!
//! A user-facing session is a [`Proxy`]; the pre-warmed backend it is mapped
//! onto is a [`DelegateProxy`]; the slot it occupies on that backend is a
//! [`Seat`]. All proxy state is immutable — mutation goes through
//! [`ProxyBuilder`], which produces a fresh snapshot.
//!
//! Runtime values are typed key/value pairs attached to a proxy and surfaced
//! as environment variables on the delegate workload and (selectively) in the
//! JSON API form. Keys are registered once at process start in a
//! process-wide registry keyed by env-var name.

pub mod delegate;
pub mod error;
pub mod mapping;
pub mod proxy;
pub mod runtime_values;
pub mod spec;

pub use delegate::{DelegateProxy, Seat};
pub use error::{ModelError, ModelResult};
pub use mapping::{mapping_path, DEFAULT_MAPPING_KEY};
pub use proxy::{Container, Proxy, ProxyBuilder, ProxyStatus, ProxyStopReason};
pub use runtime_values::{
    register_builtin_keys, register_key, registered_key, RegisteredKey, RuntimeValue,
    RuntimeValueCodec, RuntimeValueHolder, RuntimeValueKey, DELEGATE_PROXY, PUBLIC_PATH, SEAT_ID,
    TARGET_ID,
};
pub use spec::{ContainerSpec, ProxySharingSpec, ProxySpec};

/// Unique identifier for a user-facing proxy.
pub type ProxyId = String;

/// Unique identifier for a proxy spec.
pub type SpecId = String;

/// Unique identifier for a seat on a delegate workload.
pub type SeatId = String;

/// Unique identifier for a delegate proxy (pre-warmed backend).
pub type DelegateProxyId = String;

/// Unique identifier for a container belonging to a proxy.
pub type ContainerId = String;
