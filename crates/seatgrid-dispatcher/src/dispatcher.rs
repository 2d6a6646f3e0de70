//! The seat-pooling dispatcher: one instance per spec.
//!
//! `start_proxy` claims a seat (waiting when none is free), resolves the
//! delegate behind it, and rewrites the proxy snapshot to target that
//! delegate. `stop_proxy` releases the seat and cancels any waiter still in
//! `start_proxy`. Seat-available events are filtered by spec and complete
//! the targeted pending claim; everything else self-heals through the wait
//! loop's re-claims.

use std::sync::Arc;

use seatgrid_auth::UserIdentity;
use seatgrid_events::{Event, EventBus};
use seatgrid_metrics::SeatWaitMetrics;
use seatgrid_model::{
    register_builtin_keys, Proxy, ProxySpec, ProxyStatus, ProxyStopReason, RuntimeValueHolder,
    Seat, PUBLIC_PATH, SEAT_ID, TARGET_ID,
};
use seatgrid_store::{DelegateProxyStore, ProxyStore, SeatStore};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SharingConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::pending::{ClaimOutcome, PendingClaimTable};

/// Operations the admission layer drives on a dispatcher.
#[allow(async_fn_in_trait)]
pub trait ProxyDispatcher {
    /// Place the proxy onto a seat, waiting when none is free.
    ///
    /// Returns a rewritten snapshot targeting the claimed delegate, or the
    /// input unchanged when the proxy was stopped while waiting.
    async fn start_proxy(
        &self,
        user: &UserIdentity,
        proxy: Proxy,
        spec: &ProxySpec,
    ) -> DispatchResult<Proxy>;

    /// Release the proxy's seat (if any) and cancel its pending claim.
    async fn stop_proxy(&self, proxy: &Proxy, reason: ProxyStopReason) -> DispatchResult<()>;

    async fn pause_proxy(&self, proxy: &Proxy) -> DispatchResult<()>;

    async fn resume_proxy(
        &self,
        user: &UserIdentity,
        proxy: Proxy,
        spec: &ProxySpec,
    ) -> DispatchResult<Proxy>;

    fn supports_pause(&self) -> bool;

    /// Hook for injecting runtime values before expression evaluation.
    fn add_runtime_values_before_templating(
        &self,
        user: &UserIdentity,
        spec: &ProxySpec,
        proxy: Proxy,
    ) -> Proxy;
}

/// Schedules proxies of one spec onto pooled seats.
pub struct ProxySharingDispatcher {
    spec: ProxySpec,
    config: SharingConfig,
    seat_store: Arc<dyn SeatStore>,
    delegate_store: Arc<dyn DelegateProxyStore>,
    proxy_store: Arc<dyn ProxyStore>,
    bus: EventBus,
    pending: PendingClaimTable,
    metrics: Option<Arc<SeatWaitMetrics>>,
}

impl ProxySharingDispatcher {
    pub fn new(
        spec: ProxySpec,
        config: SharingConfig,
        seat_store: Arc<dyn SeatStore>,
        delegate_store: Arc<dyn DelegateProxyStore>,
        proxy_store: Arc<dyn ProxyStore>,
        bus: EventBus,
    ) -> Self {
        register_builtin_keys();
        let pending = PendingClaimTable::new(config.pending_ttl());
        Self {
            spec,
            config,
            seat_store,
            delegate_store,
            proxy_store,
            bus,
            pending,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SeatWaitMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether a spec is dispatched through seat pooling at all.
    pub fn supports_spec(spec: &ProxySpec) -> bool {
        spec.supports_sharing()
    }

    pub fn spec(&self) -> &ProxySpec {
        &self.spec
    }

    pub fn num_unclaimed_seats(&self) -> u64 {
        self.seat_store.num_unclaimed_seats()
    }

    pub fn num_claimed_seats(&self) -> u64 {
        self.seat_store.num_claimed_seats()
    }

    /// Handle a seat-available event.
    ///
    /// Events for other specs are ignored. Only targeted events complete a
    /// pending claim; untargeted ones are covered by the waiters' own
    /// re-claim timeouts.
    pub fn on_seat_available(&self, spec_id: &str, intended_proxy_id: Option<&str>) {
        if spec_id != self.spec.id {
            return;
        }
        let Some(intended) = intended_proxy_id else {
            return;
        };
        if self.pending.complete(intended) {
            debug!(proxy_id = %intended, spec_id, "pending claim completed by seat event");
        }
    }

    /// Consume bus events until shutdown. Spawn once per dispatcher.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut events = self.bus.subscribe();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(Event::SeatAvailable { spec_id, intended_proxy_id }) => {
                        self.on_seat_available(&spec_id, intended_proxy_id.as_deref());
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event stream lagged, waiters fall back to claim retries");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.changed() => {
                    info!(spec_id = %self.spec.id, "dispatcher event loop shutting down");
                    break;
                }
            }
        }
    }

    fn proxy_was_stopped(&self, proxy_id: &str) -> bool {
        match self.proxy_store.proxy(proxy_id) {
            None => true,
            Some(proxy) => matches!(proxy.status, ProxyStatus::Stopping | ProxyStatus::Stopped),
        }
    }

    /// Park a pending claim and wait for a seat in bounded attempts.
    ///
    /// `Ok(None)` means the proxy was stopped while waiting and the caller
    /// must return the input unchanged.
    async fn wait_for_seat(&self, proxy: &Proxy) -> DispatchResult<Option<Seat>> {
        info!(
            proxy_id = %proxy.id,
            spec_id = %self.spec.id,
            "seat not immediately available"
        );
        let mut claim = self.pending.insert(&proxy.id);

        // Let the scaler know there is a waiter, possibly on another replica.
        self.bus.publish(Event::PendingProxy {
            spec_id: self.spec.id.clone(),
            proxy_id: proxy.id.clone(),
        });

        for attempt in 0..self.config.max_attempts {
            match claim.wait(self.config.wait_unit()).await {
                ClaimOutcome::Cancelled => {
                    debug!(proxy_id = %proxy.id, "seat claim cancelled");
                    return Ok(None);
                }
                // A completed wake is a hint; a timeout covers missed
                // events. Both re-claim.
                ClaimOutcome::Completed | ClaimOutcome::TimedOut => {}
            }
            if self.proxy_was_stopped(&proxy.id) {
                debug!(proxy_id = %proxy.id, "stop observed while waiting for a seat");
                return Ok(None);
            }
            if let Some(seat) = self.seat_store.claim_seat(&proxy.id) {
                info!(proxy_id = %proxy.id, seat_id = %seat.id, attempt, "seat available");
                return Ok(Some(seat));
            }
        }
        Err(DispatchError::ProxyFailedToStart(proxy.id.clone()))
    }
}

impl ProxyDispatcher for ProxySharingDispatcher {
    async fn start_proxy(
        &self,
        _user: &UserIdentity,
        proxy: Proxy,
        spec: &ProxySpec,
    ) -> DispatchResult<Proxy> {
        let wait_started = Instant::now();

        let seat = match self.seat_store.claim_seat(&proxy.id) {
            Some(seat) => seat,
            None => match self.wait_for_seat(&proxy).await? {
                Some(seat) => seat,
                // Stopped while waiting; the stop path stays authoritative.
                None => return Ok(proxy),
            },
        };

        info!(
            user_id = %proxy.user_id,
            proxy_id = %proxy.id,
            spec_id = %proxy.spec_id,
            delegate_proxy_id = %seat.delegate_proxy_id,
            seat_id = %seat.id,
            "seat claimed"
        );
        self.bus.publish(Event::SeatClaimed {
            spec_id: spec.id.clone(),
            proxy_id: proxy.id.clone(),
        });
        if let Some(metrics) = &self.metrics {
            metrics.record_seat_wait(&spec.id, wait_started.elapsed());
        }

        let delegate = match self.delegate_store.delegate_proxy(&seat.delegate_proxy_id) {
            Ok(delegate) => delegate,
            Err(err) => {
                warn!(
                    proxy_id = %proxy.id,
                    seat_id = %seat.id,
                    error = %err,
                    "delegate lookup failed after claim, releasing seat"
                );
                self.seat_store.release_seat(&seat.id);
                return Err(DispatchError::ProxyFailedToStart(proxy.id));
            }
        };

        let mut builder = proxy
            .to_builder()
            .target_id(delegate.id.clone())
            .add_targets(&delegate.targets);
        if let Some(public_path) = proxy.runtime_value_or_none(&PUBLIC_PATH) {
            // Retarget the externally visible path at the delegate.
            builder = builder.put_runtime_value(
                PUBLIC_PATH.value(public_path.replace(&proxy.id, &delegate.id)),
                true,
            );
        }
        builder = builder
            .put_runtime_value(TARGET_ID.value(delegate.id.clone()), true)
            .put_runtime_value(SEAT_ID.value(seat.id.clone()), true);

        let mut container = proxy.containers[0].clone();
        container.id = Uuid::new_v4().to_string();

        Ok(builder.update_container(0, container).build())
    }

    async fn stop_proxy(&self, proxy: &Proxy, reason: ProxyStopReason) -> DispatchResult<()> {
        if let Some(seat_id) = proxy.runtime_value_or_none::<String>(&SEAT_ID) {
            self.seat_store.release_seat(&seat_id);
            info!(
                proxy_id = %proxy.id,
                spec_id = %proxy.spec_id,
                %seat_id,
                ?reason,
                "seat released"
            );
            self.bus.publish(Event::SeatReleased {
                spec_id: proxy.spec_id.clone(),
                seat_id,
                proxy_id: proxy.id.clone(),
                reason,
            });
        }

        // Release any caller still waiting in start_proxy.
        if self.pending.cancel(&proxy.id) {
            debug!(proxy_id = %proxy.id, "pending seat claim cancelled");
        }
        Ok(())
    }

    async fn pause_proxy(&self, _proxy: &Proxy) -> DispatchResult<()> {
        Err(DispatchError::Unsupported("pause"))
    }

    async fn resume_proxy(
        &self,
        _user: &UserIdentity,
        _proxy: Proxy,
        _spec: &ProxySpec,
    ) -> DispatchResult<Proxy> {
        Err(DispatchError::Unsupported("resume"))
    }

    fn supports_pause(&self) -> bool {
        false
    }

    fn add_runtime_values_before_templating(
        &self,
        _user: &UserIdentity,
        _spec: &ProxySpec,
        proxy: Proxy,
    ) -> Proxy {
        proxy
    }
}
