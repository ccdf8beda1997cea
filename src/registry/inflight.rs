//! Request coalescing for registry fetches (singleflight pattern)
//!
//! When several tasks ask for the same package while a fetch is already
//! running, only the first one talks to the registry. The others subscribe
//! to its result.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::PackageMetadata;

/// Outcome shared with waiting tasks. Errors are collapsed to `None`.
type Shared = Option<Arc<PackageMetadata>>;

enum Slot {
    Leader(broadcast::Sender<Shared>),
    Waiter(broadcast::Receiver<Shared>),
}

/// Deduplicates concurrent fetches of the same package name
#[derive(Default)]
pub struct RequestCoalescer {
    inflight: DashMap<String, broadcast::Sender<Shared>>,
    coalesced_count: AtomicU64,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fetch` for `name` unless another task is already fetching it,
    /// in which case wait for and share that task's result.
    pub async fn coalesce<F, Fut>(&self, name: &str, fetch: F) -> Shared
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Shared>,
    {
        let slot = match self.inflight.entry(name.to_string()) {
            Entry::Occupied(existing) => Slot::Waiter(existing.get().subscribe()),
            Entry::Vacant(vacant) => {
                let (tx, _rx) = broadcast::channel(1);
                vacant.insert(tx.clone());
                Slot::Leader(tx)
            }
        };

        match slot {
            Slot::Waiter(mut rx) => {
                debug!(package = name, "coalescing registry request");
                self.coalesced_count.fetch_add(1, Ordering::Relaxed);
                match rx.recv().await {
                    Ok(shared) => shared,
                    // Leader went away without publishing; fetch ourselves
                    Err(_) => fetch().await,
                }
            }
            Slot::Leader(tx) => {
                let guard = InflightGuard {
                    inflight: &self.inflight,
                    name,
                };
                let result = fetch().await;
                drop(guard);
                let _ = tx.send(result.clone());
                result
            }
        }
    }

    /// Number of requests that were served by another task's fetch
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced_count.load(Ordering::Relaxed)
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}

/// Removes the leader's in-flight entry, including when its future is
/// dropped mid-fetch. Waiters then see the channel close and fetch themselves.
struct InflightGuard<'a> {
    inflight: &'a DashMap<String, broadcast::Sender<Shared>>,
    name: &'a str,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        if self.inflight.remove(self.name).is_some() {
            debug!(package = self.name, "cleared in-flight registry request");
        }
    }
}
