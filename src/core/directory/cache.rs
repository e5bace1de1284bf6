//! Whole-snapshot TTL cache of the customer directory
//!
//! Readers clone an `Arc` to the current snapshot and never block on a
//! refresh. A refresh builds the new snapshot completely and swaps it in
//! with one write. Refreshers are serialised by an async mutex.

use crate::adapters::directory::DirectorySource;
use crate::domain::{DirectoryEntry, MatchError, MatchMethod};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Default snapshot time-to-live
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// An immutable copy of the directory
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    entries: Vec<DirectoryEntry>,
    fetched_at: Instant,
}

impl DirectorySnapshot {
    /// A snapshot taken now
    pub fn from_entries(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            fetched_at: Instant::now(),
        }
    }

    /// Entries in directory source order
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

/// TTL cache over a [`DirectorySource`]
pub struct DirectoryCache {
    source: Arc<dyn DirectorySource>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<DirectorySnapshot>>>,
    refresh_lock: tokio::sync::Mutex<()>,
    aliases: RwLock<HashMap<String, (DirectoryEntry, MatchMethod)>>,
}

impl DirectoryCache {
    pub fn new(source: Arc<dyn DirectorySource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            snapshot: RwLock::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
            aliases: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The underlying source, for point lookups
    pub fn source(&self) -> &Arc<dyn DirectorySource> {
        &self.source
    }

    /// Returns the directory snapshot
    ///
    /// With `use_cache` a fresh, non-empty snapshot is returned as is.
    /// Otherwise the whole directory is fetched and swapped in.
    ///
    /// # Errors
    ///
    /// The source's [`MatchError`]; the previous snapshot stays in place.
    pub async fn get_all(&self, use_cache: bool) -> Result<Arc<DirectorySnapshot>, MatchError> {
        if use_cache {
            if let Some(snapshot) = self.fresh_snapshot() {
                return Ok(snapshot);
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Someone else may have refreshed while we waited
        if use_cache {
            if let Some(snapshot) = self.fresh_snapshot() {
                return Ok(snapshot);
            }
        }

        let started = Instant::now();
        let entries = self.source.fetch_all().await.map_err(|e| {
            tracing::error!(error = %e, "Customer directory fetch failed");
            e
        })?;

        let snapshot = Arc::new(DirectorySnapshot::from_entries(entries));
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&snapshot));
        self.aliases.write().unwrap_or_else(|e| e.into_inner()).clear();

        tracing::info!(
            entries = snapshot.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Customer directory refreshed"
        );

        Ok(snapshot)
    }

    /// Current snapshot regardless of age
    pub fn current(&self) -> Option<Arc<DirectorySnapshot>> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn fresh_snapshot(&self) -> Option<Arc<DirectorySnapshot>> {
        self.current()
            .filter(|s| !s.is_empty() && s.age() < self.ttl)
    }

    /// Write-through insertion of an entry found by a point lookup
    ///
    /// Replaces an entry with the same id. Does nothing when no snapshot is
    /// loaded, and keeps the snapshot's original fetch time.
    pub fn insert(&self, entry: DirectoryEntry) {
        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        let Some(current) = guard.as_ref() else {
            return;
        };

        let fetched_at = current.fetched_at;
        let mut entries = current.entries.clone();
        match entries.iter().position(|e| e.id == entry.id) {
            Some(index) => entries[index] = entry,
            None => entries.push(entry),
        }

        *guard = Some(Arc::new(DirectorySnapshot {
            entries,
            fetched_at,
        }));
    }

    /// Remembers which entry a search term resolved to
    pub fn remember_alias(&self, term: &str, entry: DirectoryEntry, method: MatchMethod) {
        if term.is_empty() {
            return;
        }
        self.aliases
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(term.to_string(), (entry, method));
    }

    /// Entry previously resolved for `term`
    pub fn lookup_alias(&self, term: &str) -> Option<(DirectoryEntry, MatchMethod)> {
        self.aliases
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(term)
            .cloned()
    }

    /// Drops the snapshot and every alias
    pub fn clear(&self) {
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.aliases.write().unwrap_or_else(|e| e.into_inner()).clear();
        tracing::debug!("Customer directory cache cleared");
    }
}
