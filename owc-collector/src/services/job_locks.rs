//! Per-job-key merge locks
//!
//! Serializes the load-append-save merge of runs sharing a job key inside
//! this process. SQLite transactions cover the storage side.
//!
//! A run holds a [`JobLease`] for its whole lifetime; dropping the lease
//! (completion, error or cancellation) removes the key's entry once idle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;

type KeyMutex = Arc<tokio::sync::Mutex<()>>;

/// Map of job key to merge mutex
#[derive(Clone, Default)]
pub struct JobLocks {
    inner: Arc<Mutex<HashMap<String, KeyMutex>>>,
}

/// Keeps a job key's entry alive; releases it on drop
pub struct JobLease {
    locks: JobLocks,
    job_key: String,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    // The map is only touched in short non-async sections
    fn map(&self) -> MutexGuard<'_, HashMap<String, KeyMutex>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tie the entry of `job_key` to the returned lease
    pub fn lease(&self, job_key: &str) -> JobLease {
        JobLease {
            locks: self.clone(),
            job_key: job_key.to_string(),
        }
    }

    /// Wait for exclusive merge access to `job_key`
    pub async fn lock(&self, job_key: &str) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(self.map().entry(job_key.to_string()).or_default());
        mutex.lock_owned().await
    }

    /// Drop the entry for `job_key` if nobody holds or waits on it
    pub fn release(&self, job_key: &str) {
        let mut locks = self.map();
        if locks
            .get(job_key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(job_key);
        }
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for JobLease {
    fn drop(&mut self) {
        self.locks.release(&self.job_key);
    }
}
