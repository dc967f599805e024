//! In-flight request coalescer (`spec.md` §3 `InflightMap`, §4.5, §5).
//!
//! The first caller for a key installs a [`futures::future::Shared`] and
//! drives the computation; every concurrent caller for the same key
//! awaits a clone of that same future. The entry is removed from the map
//! exactly once, when the underlying computation completes — success or
//! failure — so a failure is never cached and the next call retries.
//! Dropping every clone of the future before it completes cancels the
//! underlying work, matching the cancellation contract in `spec.md` §5.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::Mutex;

type CoalescedResult = Result<Value, String>;
type CoalescedFuture = Shared<BoxFuture<'static, CoalescedResult>>;

#[derive(Clone)]
pub struct InflightMap {
    inner: Arc<Mutex<HashMap<String, CoalescedFuture>>>,
}

impl InflightMap {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Install-or-wait: if `key` is already in flight, await the existing
    /// future; otherwise drive `compute` and install it for concurrent
    /// callers until it resolves.
    pub async fn get_or_compute<Fut>(&self, key: String, compute: Fut) -> CoalescedResult
    where
        Fut: Future<Output = CoalescedResult> + Send + 'static,
    {
        let mut guard = self.inner.lock().await;
        if let Some(existing) = guard.get(&key) {
            let shared = existing.clone();
            drop(guard);
            return shared.await;
        }

        let map = Arc::clone(&self.inner);
        let cleanup_key = key.clone();
        let boxed: BoxFuture<'static, CoalescedResult> = async move {
            let result = compute.await;
            map.lock().await.remove(&cleanup_key);
            result
        }
        .boxed();
        let shared = boxed.shared();
        guard.insert(key, shared.clone());
        drop(guard);
        shared.await
    }

    pub async fn in_flight_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl Default for InflightMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_identical_requests_share_one_computation() {
        let map = InflightMap::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let make_future = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(serde_json::json!(42))
        };

        let a = map.get_or_compute("k".to_string(), make_future(Arc::clone(&calls)));
        let b = map.get_or_compute("k".to_string(), make_future(Arc::clone(&calls)));
        let (result_a, result_b) = tokio::join!(a, b);

        assert_eq!(result_a.unwrap(), serde_json::json!(42));
        assert_eq!(result_b.unwrap(), serde_json::json!(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn entry_is_removed_after_completion_so_failures_are_not_cached() {
        let map = InflightMap::new();
        let result = map
            .get_or_compute("k".to_string(), async { Err("boom".to_string()) })
            .await;
        assert!(result.is_err());
        assert_eq!(map.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn subsequent_call_after_completion_runs_again() {
        let map = InflightMap::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let calls = Arc::clone(&calls);
            map.get_or_compute("k".to_string(), async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::json!(1))
            })
            .await
        };
        let second = {
            let calls = Arc::clone(&calls);
            map.get_or_compute("k".to_string(), async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::json!(2))
            })
            .await
        };

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
