//! Background Jobs
//!
//! Tracks detached work (background refreshes, eviction passes) so the
//! runtime keeps it alive after the triggering response has been sent, and
//! so shutdown and tests can wait for it deterministically.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

#[derive(Default)]
struct Inner {
    tasks: Mutex<JoinSet<()>>,
    in_flight: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn log_join(result: Result<(), JoinError>) {
    match result {
        Ok(()) => {}
        Err(err) if err.is_panic() => warn!("background job panicked: {}", err),
        Err(err) => debug!("background job cancelled: {}", err),
    }
}

/// Removes a key from the in-flight set when its job ends, however it ends.
struct InFlightGuard {
    inner: Arc<Inner>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.inner.in_flight).remove(&self.key);
    }
}

// == Background Jobs ==
/// Shared handle to the set of tracked background jobs.
///
/// Cloning the handle shares the same set.
#[derive(Clone, Default)]
pub struct BackgroundJobs {
    inner: Arc<Inner>,
}

impl BackgroundJobs {
    pub fn new() -> Self {
        Self::default()
    }

    // == Spawn ==
    /// Spawns a tracked job on the current runtime.
    pub fn spawn<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = lock(&self.inner.tasks);
        // Reap finished jobs so the set does not grow without bound
        while let Some(result) = tasks.try_join_next() {
            log_join(result);
        }
        tasks.spawn(job);
    }

    // == Spawn Unique ==
    /// Spawns a tracked job unless one with the same key is still running.
    ///
    /// Returns whether the job was spawned.
    pub fn spawn_unique<F>(&self, key: impl Into<String>, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        if !lock(&self.inner.in_flight).insert(key.clone()) {
            debug!(%key, "job already in flight, skipping");
            return false;
        }

        let guard = InFlightGuard {
            inner: Arc::clone(&self.inner),
            key,
        };
        self.spawn(async move {
            let _guard = guard;
            job.await;
        });
        true
    }

    /// Whether a keyed job is currently running.
    pub fn is_in_flight(&self, key: &str) -> bool {
        lock(&self.inner.in_flight).contains(key)
    }

    /// Number of jobs not yet reaped.
    pub fn pending(&self) -> usize {
        lock(&self.inner.tasks).len()
    }

    // == Wait Idle ==
    /// Waits until every tracked job, including jobs spawned while waiting,
    /// has finished.
    pub async fn wait_idle(&self) {
        loop {
            let mut drained = std::mem::take(&mut *lock(&self.inner.tasks));
            if drained.is_empty() {
                break;
            }
            while let Some(result) = drained.join_next().await {
                log_join(result);
            }
        }
    }
}
