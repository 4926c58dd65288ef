use std::sync::Mutex;

use cached::{Cached, TimedCache};

use super::{Record, RemoteSession, RemoteTable};

pub const SESSION_LIFESPAN_SECS: u64 = 300;
pub const RECORDS_LIFESPAN_SECS: u64 = 120;

/// Short-lived copies of the remote session and of each table's rows.
///
/// Owned by the [`super::Synchronizer`]; every write through it calls
/// [`RemoteCache::invalidate`] for the table it touched.
pub struct RemoteCache {
    session: Mutex<TimedCache<(), RemoteSession>>,
    records: Mutex<TimedCache<RemoteTable, Vec<Record>>>,
}

impl Default for RemoteCache {
    fn default() -> Self {
        Self::with_lifespans(SESSION_LIFESPAN_SECS, RECORDS_LIFESPAN_SECS)
    }
}

impl RemoteCache {
    pub fn with_lifespans(session_secs: u64, records_secs: u64) -> Self {
        Self {
            session: Mutex::new(TimedCache::with_lifespan(session_secs)),
            records: Mutex::new(TimedCache::with_lifespan(records_secs)),
        }
    }

    pub fn session(&self) -> Option<RemoteSession> {
        self.session
            .lock()
            .ok()
            .and_then(|mut c| c.cache_get(&()).cloned())
    }

    pub fn store_session(&self, session: RemoteSession) {
        if let Ok(mut c) = self.session.lock() {
            c.cache_set((), session);
        }
    }

    pub fn forget_session(&self) {
        if let Ok(mut c) = self.session.lock() {
            c.cache_remove(&());
        }
    }

    pub fn records(&self, table: RemoteTable) -> Option<Vec<Record>> {
        self.records
            .lock()
            .ok()
            .and_then(|mut c| c.cache_get(&table).cloned())
    }

    pub fn store_records(&self, table: RemoteTable, rows: Vec<Record>) {
        if let Ok(mut c) = self.records.lock() {
            c.cache_set(table, rows);
        }
    }

    /// Drops the cached rows of `table`. Called after every write to it.
    pub fn invalidate(&self, table: RemoteTable) {
        if let Ok(mut c) = self.records.lock() {
            c.cache_remove(&table);
        }
    }
}
