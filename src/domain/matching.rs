//! Match results produced by the customer matcher

use super::directory::DirectoryEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum confidence for a similarity score to count as a match
pub const MATCH_THRESHOLD: f64 = 0.75;

/// Candidates above this score are reported as alternatives
pub const ALTERNATIVE_THRESHOLD: f64 = 0.5;

/// At most this many alternatives are kept
pub const MAX_ALTERNATIVES: usize = 3;

/// How a match was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Contains,
    TokenSwap,
    SignificantToken,
    EmailDomain,
    PhoneSuffix,
    /// Point lookup against the directory source after the cascade missed
    DirectLookup,
    Similarity,
    None,
}

impl MatchMethod {
    /// Confidence reported for a cascade hit with this method
    pub fn cascade_confidence(self) -> f64 {
        match self {
            Self::Exact | Self::DirectLookup => 1.0,
            Self::TokenSwap => 0.95,
            Self::Contains => 0.90,
            Self::PhoneSuffix => 0.85,
            Self::SignificantToken => 0.80,
            Self::EmailDomain => 0.70,
            Self::Similarity | Self::None => 0.0,
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::TokenSwap => "token_swap",
            Self::SignificantToken => "significant_token",
            Self::EmailDomain => "email_domain",
            Self::PhoneSuffix => "phone_suffix",
            Self::DirectLookup => "direct_lookup",
            Self::Similarity => "similarity",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

/// A scored alternative candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entry: DirectoryEntry,
    pub confidence: f64,
}

/// Outcome of resolving one search term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: bool,
    pub confidence: f64,
    pub method: MatchMethod,
    pub matched_entry: Option<DirectoryEntry>,
    #[serde(default)]
    pub alternatives: Vec<MatchCandidate>,
}

impl MatchResult {
    /// No match
    pub fn none() -> Self {
        Self {
            matched: false,
            confidence: 0.0,
            method: MatchMethod::None,
            matched_entry: None,
            alternatives: Vec::new(),
        }
    }

    /// A cascade hit; confidence comes from the method
    pub fn hit(entry: DirectoryEntry, method: MatchMethod) -> Self {
        Self {
            matched: true,
            confidence: method.cascade_confidence(),
            method,
            matched_entry: Some(entry),
            alternatives: Vec::new(),
        }
    }

    /// A similarity-scored result
    ///
    /// `matched` is true only when `confidence >= MATCH_THRESHOLD`. The best
    /// entry is kept even below the threshold so callers can inspect it.
    /// Alternatives are filtered to `> ALTERNATIVE_THRESHOLD` and truncated to
    /// [`MAX_ALTERNATIVES`] in the order given.
    pub fn scored(
        best: Option<DirectoryEntry>,
        confidence: f64,
        alternatives: Vec<MatchCandidate>,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        let matched = best.is_some() && confidence >= MATCH_THRESHOLD;
        Self {
            matched,
            confidence,
            method: if best.is_some() {
                MatchMethod::Similarity
            } else {
                MatchMethod::None
            },
            matched_entry: best,
            alternatives: alternatives
                .into_iter()
                .filter(|c| c.confidence > ALTERNATIVE_THRESHOLD)
                .take(MAX_ALTERNATIVES)
                .collect(),
        }
    }

    /// The matched entry, only when `matched` is true
    pub fn entry(&self) -> Option<&DirectoryEntry> {
        if self.matched {
            self.matched_entry.as_ref()
        } else {
            None
        }
    }
}
