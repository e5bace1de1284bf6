//! Integration tests for the customer directory cache

use almoner::adapters::directory::DirectorySource;
use almoner::core::directory::{DirectoryCache, DEFAULT_TTL};
use almoner::domain::{CustomerId, DirectoryEntry, MatchError, MatchMethod};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct FlakySource {
    fetches: AtomicUsize,
    down: AtomicBool,
}

impl FlakySource {
    fn new() -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            down: AtomicBool::new(false),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectorySource for FlakySource {
    async fn fetch_all(&self) -> Result<Vec<DirectoryEntry>, MatchError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(MatchError::DirectoryUnavailable("503 Service Unavailable".to_string()));
        }
        Ok(vec![
            entry("1", "Grace Hopper"),
            entry(&format!("{}", 100 + n), "Fetch Marker"),
        ])
    }
}

fn entry(id: &str, name: &str) -> DirectoryEntry {
    DirectoryEntry::new(CustomerId::new(id).unwrap(), name)
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_reused_until_ttl_expires() {
    let source = Arc::new(FlakySource::new());
    let cache = DirectoryCache::new(source.clone(), Duration::from_secs(300));

    cache.get_all(true).await.unwrap();
    tokio::time::advance(Duration::from_secs(299)).await;
    cache.get_all(true).await.unwrap();
    assert_eq!(source.fetches(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    let snapshot = cache.get_all(true).await.unwrap();
    assert_eq!(source.fetches(), 2);
    assert!(snapshot.entries().iter().any(|e| e.id.as_str() == "101"));
}

#[tokio::test]
async fn test_bypassing_cache_always_refetches() {
    let source = Arc::new(FlakySource::new());
    let cache = DirectoryCache::new(source.clone(), DEFAULT_TTL);

    cache.get_all(true).await.unwrap();
    cache.get_all(false).await.unwrap();
    cache.get_all(false).await.unwrap();
    assert_eq!(source.fetches(), 3);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let source = Arc::new(FlakySource::new());
    let cache = DirectoryCache::new(source.clone(), DEFAULT_TTL);

    let before = cache.get_all(true).await.unwrap();
    source.down.store(true, Ordering::SeqCst);

    let err = cache.get_all(false).await.unwrap_err();
    assert!(matches!(err, MatchError::DirectoryUnavailable(_)));

    let current = cache.current().unwrap();
    assert_eq!(current.entries(), before.entries());
}

#[tokio::test]
async fn test_clear_drops_snapshot_and_aliases() {
    let source = Arc::new(FlakySource::new());
    let cache = DirectoryCache::new(source.clone(), DEFAULT_TTL);

    cache.get_all(true).await.unwrap();
    cache.remember_alias("G. Hopper", entry("1", "Grace Hopper"), MatchMethod::Contains);
    assert!(cache.lookup_alias("G. Hopper").is_some());

    cache.clear();
    assert!(cache.current().is_none());
    assert!(cache.lookup_alias("G. Hopper").is_none());

    cache.get_all(true).await.unwrap();
    assert_eq!(source.fetches(), 2);
}

#[tokio::test]
async fn test_insert_replaces_by_id_or_appends() {
    let source = Arc::new(FlakySource::new());
    let cache = DirectoryCache::new(source, DEFAULT_TTL);

    // Nothing loaded yet
    cache.insert(entry("9", "Ignored"));
    assert!(cache.current().is_none());

    cache.get_all(true).await.unwrap();
    cache.insert(entry("1", "Rear Admiral Grace Hopper"));
    cache.insert(entry("2", "Ada Lovelace"));

    let snapshot = cache.current().unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.entries()[0].display_name, "Rear Admiral Grace Hopper");
    assert_eq!(snapshot.entries()[2].id.as_str(), "2");
}

#[tokio::test]
async fn test_concurrent_readers_share_one_fetch() {
    let source = Arc::new(FlakySource::new());
    let cache = Arc::new(DirectoryCache::new(source.clone(), DEFAULT_TTL));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move { cache.get_all(true).await.map(|s| s.len()) }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }
    assert_eq!(source.fetches(), 1);
}
