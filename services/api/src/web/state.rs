//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-ZIP report locks.

use crate::config::Config;
use outbreak_core::ports::{DatabaseService, TextGenerationService, ZipMetadataService};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub text_generator: Arc<dyn TextGenerationService>,
    pub zip_metadata: Arc<dyn ZipMetadataService>,
    pub report_locks: Arc<ZipLocks>,
}

//=========================================================================================
// ZipLocks (Serializes Read-Modify-Write per ZIP)
//=========================================================================================

/// One async lock per ZIP code.
///
/// Symptom reports load, merge and rewrite a ZIP's whole entry list, so two reports
/// for the same ZIP must not interleave. Reports for different ZIPs never wait on
/// each other. Only covers this process.
///
/// An entry lives only while some request holds or waits on it, so the map stays
/// as small as the set of ZIPs currently being written.
#[derive(Default)]
pub struct ZipLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ZipLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `zip`. Access is released when the guard drops.
    pub async fn lock(&self, zip: &str) -> ZipLockGuard<'_> {
        let lock = {
            let mut locks = self.entries();
            locks.entry(zip.to_string()).or_default().clone()
        };
        ZipLockGuard {
            locks: self,
            zip: zip.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn tracked_zips(&self) -> usize {
        self.entries().len()
    }
}

/// Exclusive access to one ZIP. Dropping it releases the lock and forgets the
/// ZIP when no other request is waiting for it.
pub struct ZipLockGuard<'a> {
    locks: &'a ZipLocks,
    zip: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ZipLockGuard<'_> {
    fn drop(&mut self) {
        // The map lock is held so no new waiter can clone the entry in between.
        let mut locks = self.locks.entries();
        drop(self.guard.take());
        let unused = locks
            .get(&self.zip)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(&self.zip);
        }
    }
}
