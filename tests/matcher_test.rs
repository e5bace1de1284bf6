//! Integration tests for customer matching

use almoner::adapters::directory::DirectorySource;
use almoner::core::directory::{DirectoryCache, DirectorySnapshot};
use almoner::core::matching::{CustomerMatcher, MatchStrategy, SearchTerms};
use almoner::domain::{CustomerId, DirectoryEntry, MatchError, MatchMethod, MatchResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct FixedDirectory {
    entries: Vec<DirectoryEntry>,
    lookup: Result<Option<DirectoryEntry>, MatchError>,
    lookups: AtomicUsize,
}

impl FixedDirectory {
    fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            lookup: Ok(None),
            lookups: AtomicUsize::new(0),
        }
    }

    fn with_lookup(mut self, lookup: Result<Option<DirectoryEntry>, MatchError>) -> Self {
        self.lookup = lookup;
        self
    }
}

#[async_trait]
impl DirectorySource for FixedDirectory {
    async fn fetch_all(&self) -> Result<Vec<DirectoryEntry>, MatchError> {
        Ok(self.entries.clone())
    }

    async fn lookup(&self, _name: &str) -> Result<Option<DirectoryEntry>, MatchError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.lookup.clone()
    }
}

struct DownDirectory;

#[async_trait]
impl DirectorySource for DownDirectory {
    async fn fetch_all(&self) -> Result<Vec<DirectoryEntry>, MatchError> {
        Err(MatchError::DirectoryUnavailable("connection refused".to_string()))
    }
}

fn entry(id: &str, name: &str) -> DirectoryEntry {
    DirectoryEntry::new(CustomerId::new(id).unwrap(), name)
}

fn matcher_over(source: Arc<dyn DirectorySource>) -> CustomerMatcher {
    CustomerMatcher::new(Arc::new(DirectoryCache::new(source, Duration::from_secs(300))))
}

#[tokio::test]
async fn test_swapped_name_found_by_third_strategy() {
    let matcher = matcher_over(Arc::new(FixedDirectory::new(vec![
        entry("10", "Acme Holdings"),
        entry("58", "Smith, John"),
    ])));

    let result = matcher.find_customer(&SearchTerms::new("John Smith")).await.unwrap();

    assert!(result.matched);
    assert_eq!(result.method, MatchMethod::TokenSwap);
    assert_eq!(result.matched_entry.unwrap().id.as_str(), "58");
}

#[tokio::test]
async fn test_exact_name_wins_before_later_strategies() {
    let matcher = matcher_over(Arc::new(FixedDirectory::new(vec![
        entry("1", "Smith, John"),
        entry("2", "John Smith"),
    ])));

    let result = matcher.find_customer(&SearchTerms::new("john smith")).await.unwrap();

    assert_eq!(result.method, MatchMethod::Exact);
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.matched_entry.unwrap().id.as_str(), "2");
}

#[tokio::test]
async fn test_cascade_miss_falls_back_to_point_lookup() {
    let found = entry("77", "Riverside Community Trust");
    let source = Arc::new(
        FixedDirectory::new(vec![entry("1", "Smith, John")]).with_lookup(Ok(Some(found.clone()))),
    );
    let matcher = matcher_over(source.clone());

    let terms = SearchTerms::new("R.C.T.");
    let result = matcher.find_customer(&terms).await.unwrap();

    assert_eq!(result.method, MatchMethod::DirectLookup);
    assert_eq!(result.matched_entry.as_ref(), Some(&found));

    let snapshot = matcher.cache().current().unwrap();
    assert!(snapshot.entries().contains(&found));

    // Second call is served from the alias table
    let again = matcher.find_customer(&terms).await.unwrap();
    assert_eq!(again.method, MatchMethod::DirectLookup);
    assert_eq!(source.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_point_lookup_failure_is_no_match() {
    let source = Arc::new(
        FixedDirectory::new(vec![entry("1", "Smith, John")]).with_lookup(Err(
            MatchError::DirectoryUnavailable("503".to_string()),
        )),
    );
    let matcher = matcher_over(source);

    let result = matcher.find_customer(&SearchTerms::new("Zed Q")).await.unwrap();
    assert!(!result.matched);
    assert_eq!(result.method, MatchMethod::None);
}

#[tokio::test]
async fn test_directory_failure_is_surfaced() {
    let matcher = matcher_over(Arc::new(DownDirectory));

    let err = matcher
        .find_customer(&SearchTerms::new("John Smith"))
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::DirectoryUnavailable(_)));

    let err = matcher
        .match_batch(&[SearchTerms::new("John Smith")])
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::DirectoryUnavailable(_)));
}

#[tokio::test]
async fn test_empty_terms_never_hit_directory() {
    let matcher = matcher_over(Arc::new(DownDirectory));
    let result = matcher.find_customer(&SearchTerms::new("   ")).await.unwrap();
    assert_eq!(result, MatchResult::none());
}

#[test]
fn test_confidence_threshold_boundary() {
    let best = entry("5", "Grace Hopper");

    let at = MatchResult::scored(Some(best.clone()), 0.75, Vec::new());
    assert!(at.matched);
    assert!(at.entry().is_some());

    let below = MatchResult::scored(Some(best), 0.749, Vec::new());
    assert!(!below.matched);
    assert!(below.entry().is_none());
    assert_eq!(below.method, MatchMethod::Similarity);
}

#[tokio::test]
async fn test_similarity_ranks_alternatives() {
    let matcher = matcher_over(Arc::new(FixedDirectory::new(vec![
        entry("1", "Jane Smithers"),
        entry("2", "John Smith"),
        entry("3", "Acme Holdings"),
    ])));

    let results = matcher
        .match_batch(&[SearchTerms::new("Jon Smith"), SearchTerms::new("Qqq")])
        .await
        .unwrap();

    assert!(results[0].matched);
    assert_eq!(results[0].method, MatchMethod::Similarity);
    assert_eq!(results[0].matched_entry.as_ref().unwrap().id.as_str(), "2");
    assert!(results[0]
        .alternatives
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));
    assert!(!results[1].matched);
}

struct MemoContains;

impl MatchStrategy for MemoContains {
    fn method(&self) -> MatchMethod {
        MatchMethod::Contains
    }

    fn find(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<DirectoryEntry> {
        snapshot
            .entries()
            .iter()
            .find(|e| e.id.as_str() == terms.text())
            .cloned()
    }
}

#[test]
fn test_appended_strategy_runs_after_defaults() {
    let cache = Arc::new(DirectoryCache::new(
        Arc::new(FixedDirectory::new(Vec::new())),
        Duration::from_secs(60),
    ));
    let matcher = CustomerMatcher::new(cache).with_strategy(Box::new(MemoContains));
    let snapshot = DirectorySnapshot::from_entries(vec![entry("4711", "Cologne Parish")]);

    let result = matcher.cascade(&SearchTerms::new("4711"), &snapshot).unwrap();
    assert_eq!(result.matched_entry.unwrap().id.as_str(), "4711");
}
