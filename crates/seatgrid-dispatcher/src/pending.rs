//! Pending seat claims: waiter handles with a write-TTL table.
//!
//! A proxy that finds no free seat parks a [`PendingClaim`] here and waits
//! on it in bounded units. The claim is signaled *completed* when a targeted
//! seat event arrives and *cancelled* when the proxy is stopped; a wait that
//! sees neither times out, which callers treat as a cue to re-claim anyway.
//!
//! Entries expire `ttl` after insertion even when nobody removes them.
//! Expiry is lazy (checked on access, swept on insert) and delivers no
//! signal: an evicted waiter keeps pacing on its per-attempt timeouts and
//! discovers cancellation through the proxy store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::debug;

/// Outcome of one bounded wait on a pending claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// A seat may be available; re-claim now.
    Completed,
    /// The proxy was stopped externally; do not claim.
    Cancelled,
    /// Nothing was signaled within the unit; re-claim defensively.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimState {
    Waiting,
    Completed,
    Cancelled,
}

/// The waiter's handle on a pending claim.
pub struct PendingClaim {
    rx: watch::Receiver<ClaimState>,
}

impl PendingClaim {
    /// Wait up to `unit` for a signal.
    ///
    /// A signal already sent is observed immediately. When the table entry
    /// has been evicted the handle keeps sleeping to its deadline, so the
    /// caller's attempt pacing survives eviction.
    pub async fn wait(&mut self, unit: Duration) -> ClaimOutcome {
        let deadline = Instant::now() + unit;
        match time::timeout_at(deadline, self.rx.changed()).await {
            Err(_) => ClaimOutcome::TimedOut,
            Ok(Err(_)) => {
                // Entry evicted; its sender is gone.
                time::sleep_until(deadline).await;
                ClaimOutcome::TimedOut
            }
            Ok(Ok(())) => match *self.rx.borrow_and_update() {
                ClaimState::Completed => ClaimOutcome::Completed,
                ClaimState::Cancelled => ClaimOutcome::Cancelled,
                ClaimState::Waiting => ClaimOutcome::TimedOut,
            },
        }
    }
}

struct PendingEntry {
    tx: watch::Sender<ClaimState>,
    inserted_at: Instant,
}

impl PendingEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// Map of proxy id → pending claim, with per-entry write-TTL.
///
/// At most one active entry exists per proxy id; inserting again replaces
/// the previous entry (callers must not run two concurrent claims for the
/// same proxy).
pub struct PendingClaimTable {
    ttl: Duration,
    entries: Mutex<HashMap<String, PendingEntry>>,
}

impl PendingClaimTable {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingEntry>> {
        self.entries.lock().expect("pending claim table lock poisoned")
    }

    /// Park a claim for the proxy and return the waiter handle.
    pub fn insert(&self, proxy_id: &str) -> PendingClaim {
        let (tx, rx) = watch::channel(ClaimState::Waiting);
        let ttl = self.ttl;
        let mut entries = self.lock();
        entries.retain(|_, entry| !entry.is_expired(ttl));
        entries.insert(
            proxy_id.to_string(),
            PendingEntry {
                tx,
                inserted_at: Instant::now(),
            },
        );
        PendingClaim { rx }
    }

    /// Remove the proxy's entry and signal its waiter *completed*. Returns
    /// whether a live entry was found.
    pub fn complete(&self, proxy_id: &str) -> bool {
        self.signal(proxy_id, ClaimState::Completed)
    }

    /// Remove the proxy's entry and signal its waiter *cancelled*. Returns
    /// whether a live entry was found.
    pub fn cancel(&self, proxy_id: &str) -> bool {
        self.signal(proxy_id, ClaimState::Cancelled)
    }

    fn signal(&self, proxy_id: &str, state: ClaimState) -> bool {
        let entry = self.lock().remove(proxy_id);
        match entry {
            Some(entry) if !entry.is_expired(self.ttl) => {
                let _ = entry.tx.send(state);
                true
            }
            Some(_) => {
                // Expired entries are dropped without a signal.
                debug!(%proxy_id, "pending claim already expired");
                false
            }
            None => false,
        }
    }

    /// Whether a live (unexpired) entry exists for the proxy.
    pub fn contains(&self, proxy_id: &str) -> bool {
        self.lock()
            .get(proxy_id)
            .map(|entry| !entry.is_expired(self.ttl))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        let ttl = self.ttl;
        self.lock()
            .values()
            .filter(|entry| !entry.is_expired(ttl))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Duration = Duration::from_secs(3);
    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn completed_signal_wakes_the_waiter() {
        let table = PendingClaimTable::new(TTL);
        let mut claim = table.insert("p1");

        assert!(table.complete("p1"));
        assert_eq!(claim.wait(UNIT).await, ClaimOutcome::Completed);
        assert!(!table.contains("p1"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_signal_wakes_the_waiter() {
        let table = PendingClaimTable::new(TTL);
        let mut claim = table.insert("p1");

        assert!(table.cancel("p1"));
        assert_eq!(claim.wait(UNIT).await, ClaimOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_wait_times_out_after_one_unit() {
        let table = PendingClaimTable::new(TTL);
        let mut claim = table.insert("p1");

        let start = Instant::now();
        assert_eq!(claim.wait(UNIT).await, ClaimOutcome::TimedOut);
        let elapsed = start.elapsed();
        assert!(elapsed >= UNIT && elapsed < UNIT + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn signal_on_absent_proxy_is_a_noop() {
        let table = PendingClaimTable::new(TTL);
        assert!(!table.complete("nobody"));
        assert!(!table.cancel("nobody"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_not_signaled() {
        let table = PendingClaimTable::new(TTL);
        let mut claim = table.insert("p1");

        time::advance(TTL + Duration::from_secs(1)).await;

        assert!(!table.contains("p1"));
        assert!(!table.complete("p1"));

        // The waiter still paces on full units.
        let start = Instant::now();
        assert_eq!(claim.wait(UNIT).await, ClaimOutcome::TimedOut);
        assert!(start.elapsed() >= UNIT);
    }

    #[tokio::test(start_paused = true)]
    async fn insert_sweeps_expired_entries() {
        let table = PendingClaimTable::new(TTL);
        let _stale = table.insert("p1");
        time::advance(TTL + Duration::from_secs(1)).await;

        let _fresh = table.insert("p2");
        assert_eq!(table.len(), 1);
        assert!(table.contains("p2"));
    }

    #[tokio::test(start_paused = true)]
    async fn reinsert_replaces_the_previous_claim() {
        let table = PendingClaimTable::new(TTL);
        let mut first = table.insert("p1");
        let mut second = table.insert("p1");

        assert_eq!(table.len(), 1);
        assert!(table.complete("p1"));
        assert_eq!(second.wait(UNIT).await, ClaimOutcome::Completed);

        // The replaced handle lost its sender and just paces.
        assert_eq!(first.wait(UNIT).await, ClaimOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn signal_sent_before_wait_is_not_lost() {
        let table = PendingClaimTable::new(TTL);
        let mut claim = table.insert("p1");
        table.cancel("p1");

        time::advance(Duration::from_secs(10)).await;
        assert_eq!(claim.wait(UNIT).await, ClaimOutcome::Cancelled);
    }
}
