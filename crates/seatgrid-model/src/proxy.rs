//! The user-facing proxy: an immutable session snapshot.
//!
//! A proxy is never mutated in place. Every change goes through
//! [`Proxy::to_builder`], which copies the snapshot, applies edits, and
//! builds a new value for the store to adopt.
//!
//! The JSON form exposes `runtimeValues` as a flat `envVar → string` map
//! restricted to keys with `include_in_api`; the other fields serialize
//! as-is. Reparsing resolves env-var names through the key registry, so an
//! unknown key is a decode error rather than a silently dropped value.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::runtime_values::{registered_key, RuntimeValue, RuntimeValueHolder};
use crate::{ContainerId, DelegateProxyId, ProxyId, SpecId};

/// Lifecycle status of a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyStatus {
    New,
    Starting,
    Up,
    Stopping,
    Stopped,
    Paused,
}

impl ProxyStatus {
    /// Whether a transition to `next` respects the lifecycle order.
    ///
    /// Transitions only move forward, except the recycle edge
    /// `Stopped → New`.
    pub fn can_transition_to(self, next: ProxyStatus) -> bool {
        if self == ProxyStatus::Stopped && next == ProxyStatus::New {
            return true;
        }
        next.rank() > self.rank()
    }

    fn rank(self) -> u8 {
        match self {
            ProxyStatus::New => 0,
            ProxyStatus::Starting => 1,
            ProxyStatus::Up => 2,
            ProxyStatus::Paused => 3,
            ProxyStatus::Stopping => 4,
            ProxyStatus::Stopped => 5,
        }
    }
}

/// Why a proxy was stopped; carried on seat-release events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyStopReason {
    UserStopped,
    IdleTimeout,
    Shutdown,
    Failed,
}

/// One container belonging to a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: ContainerId,
    pub image: String,
    pub index: u32,
}

/// A user-facing session, as an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proxy {
    pub id: ProxyId,
    pub status: ProxyStatus,
    pub created_timestamp: u64,
    pub startup_timestamp: u64,
    pub user_id: String,
    pub spec_id: SpecId,
    pub display_name: String,
    #[serde(default)]
    pub target_id: Option<DelegateProxyId>,
    /// Routing targets: mapping key → endpoint URL.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
    pub containers: Vec<Container>,
    #[serde(
        default,
        serialize_with = "serialize_runtime_values",
        deserialize_with = "deserialize_runtime_values"
    )]
    pub runtime_values: BTreeMap<String, RuntimeValue>,
}

impl Proxy {
    /// Start a builder seeded from this snapshot.
    pub fn to_builder(&self) -> ProxyBuilder {
        ProxyBuilder {
            inner: self.clone(),
        }
    }
}

impl RuntimeValueHolder for Proxy {
    fn runtime_values(&self) -> &BTreeMap<String, RuntimeValue> {
        &self.runtime_values
    }
}

/// Builds a new [`Proxy`] snapshot from an existing one.
pub struct ProxyBuilder {
    inner: Proxy,
}

impl ProxyBuilder {
    pub fn status(mut self, status: ProxyStatus) -> Self {
        self.inner.status = status;
        self
    }

    pub fn startup_timestamp(mut self, timestamp: u64) -> Self {
        self.inner.startup_timestamp = timestamp;
        self
    }

    pub fn target_id(mut self, target_id: impl Into<DelegateProxyId>) -> Self {
        self.inner.target_id = Some(target_id.into());
        self
    }

    /// Merge routing targets into the snapshot.
    pub fn add_targets(mut self, targets: &BTreeMap<String, String>) -> Self {
        self.inner
            .targets
            .extend(targets.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Attach a runtime value. An existing value under the same key is kept
    /// unless `overwrite` is set.
    pub fn put_runtime_value(mut self, value: RuntimeValue, overwrite: bool) -> Self {
        let slot = self.inner.runtime_values.entry(value.env_var.to_string());
        match slot {
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(value);
            }
            std::collections::btree_map::Entry::Occupied(mut entry) => {
                if overwrite {
                    entry.insert(value);
                }
            }
        }
        self
    }

    /// Replace the container at `index`. The index must exist.
    pub fn update_container(mut self, index: usize, container: Container) -> Self {
        self.inner.containers[index] = container;
        self
    }

    pub fn add_container(mut self, container: Container) -> Self {
        self.inner.containers.push(container);
        self
    }

    pub fn build(self) -> Proxy {
        self.inner
    }
}

fn serialize_runtime_values<S: Serializer>(
    values: &BTreeMap<String, RuntimeValue>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let api_values: BTreeMap<&str, &str> = values
        .values()
        .filter(|value| value.include_in_api)
        .map(|value| (value.env_var, value.value.as_str()))
        .collect();
    api_values.serialize(serializer)
}

fn deserialize_runtime_values<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, RuntimeValue>, D::Error> {
    let raw: BTreeMap<String, String> = BTreeMap::deserialize(deserializer)?;
    let mut values = BTreeMap::new();
    for (env_var, value) in raw {
        let key = registered_key(&env_var).map_err(D::Error::custom)?;
        values.insert(env_var, RuntimeValue::from_registered(key, value));
    }
    Ok(values)
}
