//! Inbox feed: fetch, assemble, publish

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::Arc;

use crate::models::EmailThread;
use crate::notify::{Notice, Notifier};
use crate::query::assemble_threads;
use crate::storage::TriageStore;

use super::refresh_due;

/// Receives the thread list after every refresh
pub trait ThreadListener: Send + Sync {
    fn threads_updated(&self, threads: &[EmailThread]);
}

/// Statistics from one refresh
#[derive(Debug, Default, Clone)]
pub struct RefreshStats {
    /// Rows returned by storage
    pub rows_fetched: usize,
    /// Threads assembled from those rows
    pub threads: usize,
    /// Threads with a draft waiting for validation
    pub awaiting_validation: usize,
    /// Whether the fetch failed and the list was emptied
    pub failed: bool,
    /// Duration of the refresh
    pub duration_ms: u64,
}

/// Owns the latest thread list and rebuilds it on demand
///
/// A failed fetch is reported through the notifier and leaves an empty list;
/// it never aborts the caller.
pub struct InboxFeed {
    store: Arc<dyn TriageStore>,
    notifier: Arc<dyn Notifier>,
    categories: Vec<String>,
    interval_secs: u64,
    threads: Vec<EmailThread>,
    last_refresh_at: Option<DateTime<Utc>>,
    listeners: Vec<Arc<dyn ThreadListener>>,
}

impl InboxFeed {
    pub fn new(
        store: Arc<dyn TriageStore>,
        notifier: Arc<dyn Notifier>,
        categories: Vec<String>,
        interval_secs: u64,
    ) -> Self {
        Self {
            store,
            notifier,
            categories,
            interval_secs,
            threads: Vec::new(),
            last_refresh_at: None,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for future refreshes
    pub fn subscribe(&mut self, listener: Arc<dyn ThreadListener>) {
        self.listeners.push(listener);
    }

    /// Latest assembled threads
    pub fn threads(&self) -> &[EmailThread] {
        &self.threads
    }

    pub fn last_refresh_at(&self) -> Option<DateTime<Utc>> {
        self.last_refresh_at
    }

    /// Whether the polling interval has elapsed
    pub fn is_due(&self) -> bool {
        refresh_due(self.last_refresh_at, self.interval_secs)
    }

    /// Fetch rows, rebuild threads and notify listeners
    pub fn refresh(&mut self) -> RefreshStats {
        let start = std::time::Instant::now();
        let mut stats = RefreshStats::default();

        match self.store.list_emails_by_categories(&self.categories) {
            Ok(rows) => {
                stats.rows_fetched = rows.len();
                self.threads = assemble_threads(rows);
            }
            Err(e) => {
                debug!("Email fetch failed: {:#}", e);
                self.notifier.notify(Notice::error("Failed to load emails"));
                self.threads.clear();
                stats.failed = true;
            }
        }

        stats.threads = self.threads.len();
        stats.awaiting_validation = self.threads.iter().filter(|t| t.has_unread_replies).count();
        self.last_refresh_at = Some(Utc::now());

        for listener in &self.listeners {
            listener.threads_updated(&self.threads);
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Refreshed inbox: {} rows, {} threads, {} awaiting validation",
            stats.rows_fetched, stats.threads, stats.awaiting_validation
        );
        stats
    }

    /// Refresh only when the polling interval has elapsed
    pub fn refresh_if_due(&mut self) -> Option<RefreshStats> {
        self.is_due().then(|| self.refresh())
    }
}
