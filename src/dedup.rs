//! Collapse concurrent identical requests onto one in-flight future.
//!
//! The first caller for a signature creates the request; everyone arriving while it
//! is pending awaits the same [`Shared`] future and observes the same output. The
//! entry is removed as soon as the request settles, from inside the shared future,
//! so anything the request writes (e.g. a cache entry) is visible before any caller
//! sees the output.

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::lock;

/// Pending entries older than this are assumed stuck and replaced.
pub const PENDING_CEILING: Duration = Duration::from_secs(30);

struct PendingRequest<T> {
    future: Shared<BoxFuture<'static, T>>,
    started_at: Instant,
    id: u64,
}

struct PendingMap<T> {
    requests: HashMap<String, PendingRequest<T>>,
    next_id: u64,
}

/// At most one in-flight request per signature.
pub struct RequestDeduplicator<T> {
    pending: Arc<Mutex<PendingMap<T>>>,
    ceiling: Duration,
}

impl<T> Clone for RequestDeduplicator<T> {
    fn clone(&self) -> Self {
        RequestDeduplicator {
            pending: Arc::clone(&self.pending),
            ceiling: self.ceiling,
        }
    }
}

impl<T> Default for RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(PENDING_CEILING)
    }
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(ceiling: Duration) -> Self {
        RequestDeduplicator {
            pending: Arc::new(Mutex::new(PendingMap {
                requests: HashMap::new(),
                next_id: 0,
            })),
            ceiling,
        }
    }

    /// Run `factory()` unless a request with the same signature is already pending,
    /// in which case join it instead.
    ///
    /// `factory` is only invoked for the first caller. Dropping the returned future
    /// abandons interest without cancelling the shared request for other joiners.
    pub async fn deduplicate<F, Fut>(&self, signature: &str, factory: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let future = {
            let mut pending = lock(&self.pending);
            self.evict_stale(&mut pending);

            if let Some(entry) = pending.requests.get(signature) {
                debug!("joining in-flight request {}", signature);
                entry.future.clone()
            } else {
                let id = pending.next_id;
                pending.next_id = pending.next_id.wrapping_add(1);

                let map = Arc::clone(&self.pending);
                let key = signature.to_string();
                let request = factory();
                let future = async move {
                    let output = request.await;
                    let mut pending = lock(&map);
                    // a stuck entry may have been replaced by a newer request
                    if pending.requests.get(&key).map_or(false, |e| e.id == id) {
                        pending.requests.remove(&key);
                    }
                    debug!("request {} settled", key);
                    output
                }
                .boxed()
                .shared();

                debug!("starting request {}", signature);
                pending.requests.insert(
                    signature.to_string(),
                    PendingRequest {
                        future: future.clone(),
                        started_at: Instant::now(),
                        id,
                    },
                );
                future
            }
        };
        future.await
    }

    /// Number of requests currently in flight.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).requests.len()
    }

    fn evict_stale(&self, pending: &mut PendingMap<T>) {
        let ceiling = self.ceiling;
        pending.requests.retain(|signature, entry| {
            let age = entry.started_at.elapsed();
            if age > ceiling {
                warn!(
                    "evicting request {} pending for {}s",
                    signature,
                    age.as_secs()
                );
                false
            } else {
                true
            }
        });
    }
}
