//! Proxy specs — templates describing a class of proxies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::SpecId;

/// Template for one class of proxies, loaded at startup and immutable at
/// runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxySpec {
    pub id: SpecId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub container_specs: Vec<ContainerSpec>,
    #[serde(default)]
    pub sharing: ProxySharingSpec,
}

impl ProxySpec {
    /// Whether proxies of this spec are placed onto pooled seats.
    pub fn supports_sharing(&self) -> bool {
        self.sharing.minimum_seats_available.is_some()
    }
}

/// Spec for one container of a proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerSpec {
    pub image: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Seat-pooling extension of a spec.
///
/// `minimum_seats_available` is consumed by the scaler to size the warm
/// delegate pool; the dispatcher only checks its presence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxySharingSpec {
    #[serde(default)]
    pub minimum_seats_available: Option<u32>,
}
