//! Stale-Entry Sweep Task
//!
//! Background task that periodically drops cache entries past their TTL.
//! Reads already ignore stale entries; the sweep only bounds memory held by
//! entries that are never read again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that purges stale entries every `interval`.
///
/// The write lock is taken only for the purge itself.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_sweep_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting cache sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.purge_expired();

            if removed > 0 {
                info!("Cache sweep: removed {} stale entries", removed);
            } else {
                debug!("Cache sweep: no stale entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{self, Fingerprint, ManualClock, QueryCache};
    use crate::filter::Filter;
    use serde_json::json;
    use std::sync::Arc;

    fn fp(user: &str) -> Fingerprint {
        Fingerprint::new("expenses", &Filter::new().eq("user_id", user))
    }

    #[tokio::test]
    async fn test_sweep_removes_stale_entries() {
        let clock = ManualClock::new(0);
        let cache = cache::shared(QueryCache::with_clock(
            Duration::from_secs(300),
            Arc::new(clock.clone()),
        ));

        cache.write().await.set(fp("u1"), vec![json!({"id": 1})]);
        clock.advance_secs(301);
        cache.write().await.set(fp("u2"), vec![json!({"id": 2})]);

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        {
            let guard = cache.read().await;
            assert!(!guard.contains(&fp("u1")), "stale entry should be swept");
            assert!(guard.contains(&fp("u2")), "fresh entry should survive");
            assert_eq!(guard.stats().expirations, 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let cache = cache::shared(QueryCache::new(Duration::from_secs(300)));

        let handle = spawn_sweep_task(cache, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
