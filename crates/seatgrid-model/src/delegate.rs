//! Delegate workloads and the seats they host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DelegateProxyId, ProxyId, SeatId};

/// A pre-warmed backend workload hosting one or more seats.
///
/// Once a delegate reports ready its targets never change; the store
/// enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateProxy {
    pub id: DelegateProxyId,
    /// Routing targets: mapping key → endpoint URL.
    pub targets: BTreeMap<String, String>,
    pub ready: bool,
}

/// One claimable slot on a delegate workload.
///
/// A seat is claimed exactly when it carries a claimant proxy id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: SeatId,
    pub delegate_proxy_id: DelegateProxyId,
    pub claimant_proxy_id: Option<ProxyId>,
}

impl Seat {
    /// A fresh, unclaimed seat on the given delegate.
    pub fn new(id: impl Into<SeatId>, delegate_proxy_id: impl Into<DelegateProxyId>) -> Self {
        Self {
            id: id.into(),
            delegate_proxy_id: delegate_proxy_id.into(),
            claimant_proxy_id: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimant_proxy_id.is_some()
    }
}
