//! Registry of delegate workloads.

use std::collections::HashMap;
use std::sync::RwLock;

use seatgrid_model::{DelegateProxy, DelegateProxyId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Resolves delegate ids to their current endpoints.
pub trait DelegateProxyStore: Send + Sync {
    /// Look up a delegate. Fails with [`StoreError::DelegateMissing`] when
    /// the delegate was retired in the meantime.
    fn delegate_proxy(&self, delegate_proxy_id: &str) -> StoreResult<DelegateProxy>;

    /// Insert or update a delegate. Targets of a ready delegate are
    /// immutable.
    fn put_delegate_proxy(&self, delegate: DelegateProxy) -> StoreResult<()>;

    /// Remove a drained delegate. Idempotent.
    fn remove_delegate_proxy(&self, delegate_proxy_id: &str);

    fn delegate_proxy_ids(&self) -> Vec<DelegateProxyId>;
}

/// In-memory [`DelegateProxyStore`].
#[derive(Default)]
pub struct MemoryDelegateProxyStore {
    delegates: RwLock<HashMap<DelegateProxyId, DelegateProxy>>,
}

impl MemoryDelegateProxyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<DelegateProxyId, DelegateProxy>> {
        self.delegates.read().expect("delegate store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<DelegateProxyId, DelegateProxy>> {
        self.delegates.write().expect("delegate store lock poisoned")
    }
}

impl DelegateProxyStore for MemoryDelegateProxyStore {
    fn delegate_proxy(&self, delegate_proxy_id: &str) -> StoreResult<DelegateProxy> {
        self.read()
            .get(delegate_proxy_id)
            .cloned()
            .ok_or_else(|| StoreError::DelegateMissing(delegate_proxy_id.to_string()))
    }

    fn put_delegate_proxy(&self, delegate: DelegateProxy) -> StoreResult<()> {
        let mut delegates = self.write();
        if let Some(existing) = delegates.get(&delegate.id) {
            if existing.ready && existing.targets != delegate.targets {
                return Err(StoreError::DelegateTargetsImmutable(delegate.id));
            }
        }
        debug!(delegate_proxy_id = %delegate.id, ready = delegate.ready, "delegate proxy stored");
        delegates.insert(delegate.id.clone(), delegate);
        Ok(())
    }

    fn remove_delegate_proxy(&self, delegate_proxy_id: &str) {
        if self.write().remove(delegate_proxy_id).is_some() {
            debug!(%delegate_proxy_id, "delegate proxy removed");
        }
    }

    fn delegate_proxy_ids(&self) -> Vec<DelegateProxyId> {
        self.read().keys().cloned().collect()
    }
}
