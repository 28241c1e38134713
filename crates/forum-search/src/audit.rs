//! Search audit trail.
//!
//! Every successful search may append one entry to the search log. Writes
//! happen off the request path: a failed write is logged and counted, and
//! never fails the search that triggered it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use forum_storage::Storage;
use forum_types::{SearchLogEntry, Viewer};

use crate::context::ResolvedContext;
use crate::error::SearchError;

/// Destination for search log entries.
pub trait SearchLogSink: Send + Sync + 'static {
    fn append(&self, entry: &SearchLogEntry) -> Result<(), SearchError>;
}

impl SearchLogSink for Storage {
    fn append(&self, entry: &SearchLogEntry) -> Result<(), SearchError> {
        self.append_search_log(entry)?;
        Ok(())
    }
}

/// In-memory sink for tests.
#[derive(Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<SearchLogEntry>>,
    fail: bool,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<SearchLogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl SearchLogSink for MemoryLogSink {
    fn append(&self, entry: &SearchLogEntry) -> Result<(), SearchError> {
        if self.fail {
            return Err(SearchError::BackingStore("search log unavailable".to_string()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SearchError::BackingStore("search log lock poisoned".to_string()))?;
        entries.push(entry.clone());
        Ok(())
    }
}

/// Fire-and-forget recorder of executed searches.
pub struct SearchAuditLog {
    sink: Arc<dyn SearchLogSink>,
    pending: Mutex<JoinSet<()>>,
    failed_writes: Arc<AtomicU64>,
}

impl SearchAuditLog {
    pub fn new(sink: Arc<dyn SearchLogSink>) -> Self {
        Self {
            sink,
            pending: Mutex::new(JoinSet::new()),
            failed_writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue an entry for the literal term as supplied.
    ///
    /// Does nothing when auditing is disabled. Must be called from within a
    /// Tokio runtime.
    pub fn record(
        &self,
        term: &str,
        context: Option<&ResolvedContext>,
        viewer: &Viewer,
        auditing_enabled: bool,
    ) {
        if !auditing_enabled {
            return;
        }

        let entry = SearchLogEntry::new(term, Utc::now())
            .with_context_type(context.map(ResolvedContext::entity_type))
            .with_user(viewer.user_id);

        let sink = self.sink.clone();
        let failed_writes = self.failed_writes.clone();

        let Ok(mut pending) = self.pending.lock() else {
            failed_writes.fetch_add(1, Ordering::Relaxed);
            warn!(term = %entry.term, "Search log queue poisoned, dropping entry");
            return;
        };

        // Reap finished writes so the set does not grow without bound
        while pending.try_join_next().is_some() {}

        pending.spawn_blocking(move || {
            if let Err(e) = sink.append(&entry) {
                failed_writes.fetch_add(1, Ordering::Relaxed);
                warn!(term = %entry.term, error = %e, "Failed to persist search log entry");
            } else {
                debug!(term = %entry.term, "Recorded search");
            }
        });
    }

    /// Wait for every queued write to finish.
    pub async fn flush(&self) {
        let mut pending = match self.pending.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return,
        };
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                self.failed_writes.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Search log writer panicked");
            }
        }
    }

    /// Writes that failed since startup.
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }
}
