//! Live site settings consulted per request.

use std::sync::atomic::{AtomicBool, Ordering};

use forum_types::Settings;

/// Source of the audit toggle, read fresh for every search.
pub trait AuditingConfig: Send + Sync {
    fn auditing_enabled(&self) -> bool;
}

/// Runtime-adjustable site settings.
#[derive(Debug)]
pub struct SiteSettings {
    log_search_queries: AtomicBool,
}

impl SiteSettings {
    pub fn new(log_search_queries: bool) -> Self {
        Self {
            log_search_queries: AtomicBool::new(log_search_queries),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.log_search_queries)
    }

    pub fn log_search_queries(&self) -> bool {
        self.log_search_queries.load(Ordering::SeqCst)
    }

    /// Takes effect for the next search.
    pub fn set_log_search_queries(&self, enabled: bool) {
        self.log_search_queries.store(enabled, Ordering::SeqCst);
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AuditingConfig for SiteSettings {
    fn auditing_enabled(&self) -> bool {
        self.log_search_queries()
    }
}
