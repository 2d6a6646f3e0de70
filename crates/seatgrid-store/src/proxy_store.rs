//! Registry of user-facing proxies.

use std::collections::HashMap;
use std::sync::RwLock;

use seatgrid_model::{Proxy, ProxyId};
use tracing::debug;

/// Authoritative latest snapshots of user-facing proxies, including status
/// changes made by unrelated control paths. The dispatcher polls this to
/// detect cancellation mid-wait.
pub trait ProxyStore: Send + Sync {
    fn proxy(&self, proxy_id: &str) -> Option<Proxy>;

    /// Adopt a new snapshot for the proxy.
    fn put_proxy(&self, proxy: Proxy);

    /// Purge a stopped proxy. Idempotent.
    fn remove_proxy(&self, proxy_id: &str);

    fn proxy_ids(&self) -> Vec<ProxyId>;
}

/// In-memory [`ProxyStore`].
#[derive(Default)]
pub struct MemoryProxyStore {
    proxies: RwLock<HashMap<ProxyId, Proxy>>,
}

impl MemoryProxyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProxyStore for MemoryProxyStore {
    fn proxy(&self, proxy_id: &str) -> Option<Proxy> {
        self.proxies
            .read()
            .expect("proxy store lock poisoned")
            .get(proxy_id)
            .cloned()
    }

    fn put_proxy(&self, proxy: Proxy) {
        debug!(proxy_id = %proxy.id, status = ?proxy.status, "proxy snapshot stored");
        self.proxies
            .write()
            .expect("proxy store lock poisoned")
            .insert(proxy.id.clone(), proxy);
    }

    fn remove_proxy(&self, proxy_id: &str) {
        self.proxies
            .write()
            .expect("proxy store lock poisoned")
            .remove(proxy_id);
    }

    fn proxy_ids(&self) -> Vec<ProxyId> {
        self.proxies
            .read()
            .expect("proxy store lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}
