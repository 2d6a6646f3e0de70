//! Session recovery — rebuild proxies from containers that survived a
//! restart.
//!
//! On startup, when `persist-sessions` is enabled, the container runtime is
//! scanned for containers carrying proxy metadata. Containers are grouped by
//! proxy id and rebuilt into [`Proxy`] snapshots: a proxy is Up as soon as
//! one of its containers is running, Stopped otherwise. Containers whose
//! spec is no longer configured are skipped.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use seatgrid_model::{Container, Proxy, ProxySpec, ProxyStatus};
use tracing::{info, warn};

use crate::proxy_store::ProxyStore;

/// Metadata of one container found by scanning the container runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingContainerInfo {
    pub container_id: String,
    pub proxy_id: String,
    pub spec_id: String,
    pub user_id: String,
    pub image: String,
    pub startup_timestamp: u64,
    pub running: bool,
}

/// Container-runtime adapter contract: enumerate containers left over from a
/// previous run.
pub trait ContainerScanner: Send + Sync {
    fn scan_existing_containers(&self) -> anyhow::Result<Vec<ExistingContainerInfo>>;
}

/// Provides the configured specs by id.
pub trait SpecProvider: Send + Sync {
    fn spec(&self, spec_id: &str) -> Option<ProxySpec>;
}

/// Rebuilds proxy snapshots from scanned containers and installs them into
/// the proxy store.
pub struct SessionRecovery {
    enabled: bool,
    scanner: Arc<dyn ContainerScanner>,
    specs: Arc<dyn SpecProvider>,
    proxies: Arc<dyn ProxyStore>,
    ready: AtomicBool,
}

impl SessionRecovery {
    pub fn new(
        enabled: bool,
        scanner: Arc<dyn ContainerScanner>,
        specs: Arc<dyn SpecProvider>,
        proxies: Arc<dyn ProxyStore>,
    ) -> Self {
        Self {
            enabled,
            scanner,
            specs,
            proxies,
            ready: AtomicBool::new(false),
        }
    }

    /// Scan and re-install previous sessions. Returns how many proxies were
    /// recovered.
    pub fn resume_previous_sessions(&self) -> anyhow::Result<u64> {
        if !self.enabled {
            info!("session persistence disabled");
            self.ready.store(true, Ordering::Release);
            return Ok(0);
        }
        info!("session persistence enabled");

        let mut recovered: HashMap<String, Proxy> = HashMap::new();
        for container_info in self.scanner.scan_existing_containers()? {
            let proxy = match recovered.entry(container_info.proxy_id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let Some(spec) = self.specs.spec(&container_info.spec_id) else {
                        warn!(
                            container_id = %container_info.container_id,
                            spec_id = %container_info.spec_id,
                            "found existing container without a configured spec, skipping"
                        );
                        continue;
                    };
                    entry.insert(empty_proxy(&container_info, &spec))
                }
            };
            let index = proxy.containers.len() as u32;
            let mut builder = proxy.to_builder().add_container(Container {
                id: container_info.container_id.clone(),
                image: container_info.image.clone(),
                index,
            });
            if container_info.running {
                // One running container is enough to consider the proxy up.
                builder = builder.status(ProxyStatus::Up);
            }
            *proxy = builder.build();
        }

        let count = recovered.len() as u64;
        for (_, proxy) in recovered {
            self.proxies.put_proxy(proxy);
        }
        info!(recovered = count, "previous sessions resumed");

        self.ready.store(true, Ordering::Release);
        Ok(count)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

fn empty_proxy(container_info: &ExistingContainerInfo, spec: &ProxySpec) -> Proxy {
    Proxy {
        id: container_info.proxy_id.clone(),
        status: ProxyStatus::Stopped,
        created_timestamp: container_info.startup_timestamp,
        startup_timestamp: container_info.startup_timestamp,
        user_id: container_info.user_id.clone(),
        spec_id: container_info.spec_id.clone(),
        display_name: spec
            .display_name
            .clone()
            .unwrap_or_else(|| spec.id.clone()),
        target_id: None,
        targets: Default::default(),
        containers: Vec::new(),
        runtime_values: Default::default(),
    }
}
