//! Customer matcher
//!
//! Resolves a donor to a directory entry. [`CustomerMatcher::find_customer`]
//! runs the strategy cascade; [`CustomerMatcher::score`] and
//! [`CustomerMatcher::match_batch`] rank every entry by similarity instead.

use super::normalize::SearchTerms;
use super::similarity::score_entry;
use super::strategies::{default_strategies, MatchStrategy};
use crate::core::directory::{DirectoryCache, DirectorySnapshot};
use crate::domain::{MatchCandidate, MatchError, MatchMethod, MatchResult};
use std::cmp::Ordering;
use std::sync::Arc;

/// Cascading fuzzy search over a [`DirectoryCache`]
pub struct CustomerMatcher {
    cache: Arc<DirectoryCache>,
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl CustomerMatcher {
    /// Matcher with the default six-step cascade
    pub fn new(cache: Arc<DirectoryCache>) -> Self {
        Self {
            cache,
            strategies: default_strategies(),
        }
    }

    /// Appends a strategy after the existing ones
    pub fn with_strategy(mut self, strategy: Box<dyn MatchStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn cache(&self) -> &Arc<DirectoryCache> {
        &self.cache
    }

    /// Resolves `terms` through aliases, the cascade and a point lookup
    ///
    /// Empty terms give a no-match result.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] when the directory snapshot cannot be fetched.
    pub async fn find_customer(&self, terms: &SearchTerms) -> Result<MatchResult, MatchError> {
        if terms.is_empty() {
            return Ok(MatchResult::none());
        }

        let alias_key = terms.alias_key();
        if let Some((entry, method)) = self.cache.lookup_alias(&alias_key) {
            tracing::trace!(term = %alias_key, customer_id = %entry.id, "Alias hit");
            return Ok(MatchResult::hit(entry, method));
        }

        let snapshot = self.cache.get_all(true).await?;
        if let Some(result) = self.cascade(terms, &snapshot) {
            if let Some(entry) = &result.matched_entry {
                self.cache
                    .remember_alias(&alias_key, entry.clone(), result.method);
            }
            return Ok(result);
        }

        if terms.text().is_empty() {
            return Ok(MatchResult::none());
        }

        match self.cache.source().lookup(terms.text()).await {
            Ok(Some(entry)) => {
                tracing::debug!(term = %terms.text(), customer_id = %entry.id, "Point lookup hit");
                self.cache.insert(entry.clone());
                self.cache
                    .remember_alias(&alias_key, entry.clone(), MatchMethod::DirectLookup);
                Ok(MatchResult::hit(entry, MatchMethod::DirectLookup))
            }
            Ok(None) => Ok(MatchResult::none()),
            Err(e) => {
                tracing::warn!(term = %terms.text(), error = %e, "Point lookup failed");
                Ok(MatchResult::none())
            }
        }
    }

    /// First strategy hit against `snapshot`, without aliases or lookups
    pub fn cascade(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<MatchResult> {
        self.strategies.iter().find_map(|strategy| {
            let result = strategy.try_match(terms, snapshot)?;
            tracing::debug!(
                term = %terms.text(),
                method = %result.method,
                customer_id = result.matched_entry.as_ref().map(|e| e.id.as_str()).unwrap_or(""),
                "Cascade hit"
            );
            Some(result)
        })
    }

    /// Similarity-ranked result for `terms` against `snapshot`
    ///
    /// The best-scoring entry wins (first in directory order on ties); the
    /// rest become alternatives, highest first.
    pub fn score(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> MatchResult {
        if terms.normalized().is_empty() || snapshot.is_empty() {
            return MatchResult::none();
        }

        let mut scored: Vec<MatchCandidate> = snapshot
            .entries()
            .iter()
            .map(|entry| MatchCandidate {
                confidence: score_entry(terms.text(), entry),
                entry: entry.clone(),
            })
            .collect();

        let mut best_index = 0;
        for (index, candidate) in scored.iter().enumerate() {
            if candidate.confidence > scored[best_index].confidence {
                best_index = index;
            }
        }
        let best = scored.remove(best_index);

        scored.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });

        MatchResult::scored(Some(best.entry), best.confidence, scored)
    }

    /// Similarity-ranks every term against one snapshot
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] when the directory snapshot cannot be fetched.
    pub async fn match_batch(&self, terms: &[SearchTerms]) -> Result<Vec<MatchResult>, MatchError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.cache.get_all(true).await?;
        Ok(terms.iter().map(|t| self.score(t, &snapshot)).collect())
    }
}
