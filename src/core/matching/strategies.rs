//! Cascade match strategies
//!
//! Each strategy looks for one kind of evidence. The matcher tries them in
//! order and stops at the first hit. Within a strategy the first entry in
//! directory order wins.

use super::normalize::{digits, is_stopword, normalize_name, swapped_form, tokens, SearchTerms};
use crate::core::directory::DirectorySnapshot;
use crate::domain::{DirectoryEntry, MatchMethod, MatchResult};

/// Shortest name fragment the contains strategy will consider
const MIN_CONTAINS_LEN: usize = 4;

/// Tokens at or below this length are not significant
const MIN_SIGNIFICANT_LEN: usize = 3;

/// Digits compared by the phone strategy
const PHONE_SUFFIX_LEN: usize = 7;

/// Consumer mail providers; their domain says nothing about the donor
const FREE_MAIL_DOMAINS: &[&str] = &[
    "gmail", "googlemail", "yahoo", "hotmail", "outlook", "live", "msn", "aol", "icloud", "me",
    "mac", "protonmail", "proton", "gmx", "mail", "comcast", "verizon", "att", "sbcglobal",
];

/// Second-level labels skipped when reading an organisation out of a domain
const SECOND_LEVEL_LABELS: &[&str] = &["co", "com", "org", "net", "ac", "gov", "edu"];

/// One step of the match cascade
pub trait MatchStrategy: Send + Sync {
    /// Method reported on a hit
    fn method(&self) -> MatchMethod;

    /// First entry this strategy accepts for `terms`
    fn find(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<DirectoryEntry>;

    /// Runs the strategy, wrapping a hit in a [`MatchResult`]
    fn try_match(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<MatchResult> {
        self.find(terms, snapshot)
            .map(|entry| MatchResult::hit(entry, self.method()))
    }
}

/// The cascade in evaluation order
pub fn default_strategies() -> Vec<Box<dyn MatchStrategy>> {
    vec![
        Box::new(ExactName),
        Box::new(ContainsName),
        Box::new(TokenSwap),
        Box::new(SignificantToken),
        Box::new(EmailDomain),
        Box::new(PhoneSuffix),
    ]
}

fn first_entry<'a>(
    snapshot: &'a DirectorySnapshot,
    mut accept: impl FnMut(&str) -> bool,
) -> Option<&'a DirectoryEntry> {
    snapshot
        .entries()
        .iter()
        .find(|entry| entry.names().any(|name| accept(name)))
}

/// Normalized search text equals a normalized name
pub struct ExactName;

impl MatchStrategy for ExactName {
    fn method(&self) -> MatchMethod {
        MatchMethod::Exact
    }

    fn find(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<DirectoryEntry> {
        let needle = terms.normalized();
        if needle.is_empty() {
            return None;
        }
        first_entry(snapshot, |name| normalize_name(name) == needle).cloned()
    }
}

/// One of search text and name contains the other
pub struct ContainsName;

impl MatchStrategy for ContainsName {
    fn method(&self) -> MatchMethod {
        MatchMethod::Contains
    }

    fn find(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<DirectoryEntry> {
        let needle = terms.normalized();
        if needle.chars().count() < MIN_CONTAINS_LEN {
            return None;
        }
        first_entry(snapshot, |name| {
            let name = normalize_name(name);
            name.chars().count() >= MIN_CONTAINS_LEN
                && (name.contains(needle) || needle.contains(&name))
        })
        .cloned()
    }
}

/// `First Last` against `Last, First`, in either direction
pub struct TokenSwap;

impl MatchStrategy for TokenSwap {
    fn method(&self) -> MatchMethod {
        MatchMethod::TokenSwap
    }

    fn find(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<DirectoryEntry> {
        let needle = terms.normalized();
        let swapped = swapped_form(terms.text());
        if needle.is_empty() {
            return None;
        }
        first_entry(snapshot, |name| {
            let normalized = normalize_name(name);
            swapped.as_deref() == Some(normalized.as_str())
                || swapped_form(name).as_deref() == Some(needle)
        })
        .cloned()
    }
}

/// A distinctive word of the search text appears as a whole word in a name
///
/// Words longer than three characters that are not stopwords are tried
/// longest first.
pub struct SignificantToken;

impl MatchStrategy for SignificantToken {
    fn method(&self) -> MatchMethod {
        MatchMethod::SignificantToken
    }

    fn find(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<DirectoryEntry> {
        let mut significant: Vec<String> = tokens(terms.text())
            .into_iter()
            .filter(|t| t.chars().count() > MIN_SIGNIFICANT_LEN && !is_stopword(t))
            .collect();
        significant.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
        significant.dedup();

        significant.iter().find_map(|token| {
            first_entry(snapshot, |name| tokens(name).iter().any(|t| t == token)).cloned()
        })
    }
}

/// Organisation part of an email domain appears in a name
pub struct EmailDomain;

impl EmailDomain {
    /// `jane@mail.acme.co.uk` gives `acme`; free-mail providers give nothing
    pub fn organisation(email: &str) -> Option<String> {
        let (_, domain) = email.rsplit_once('@')?;
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        let mut labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
        if labels.len() < 2 {
            return None;
        }
        labels.pop();
        if labels.len() > 1 && labels.last().is_some_and(|l| SECOND_LEVEL_LABELS.contains(l)) {
            labels.pop();
        }
        let organisation = normalize_name(labels.last()?).replace(' ', "");
        if organisation.len() < 3 || FREE_MAIL_DOMAINS.contains(&organisation.as_str()) {
            return None;
        }
        Some(organisation)
    }
}

impl MatchStrategy for EmailDomain {
    fn method(&self) -> MatchMethod {
        MatchMethod::EmailDomain
    }

    fn find(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<DirectoryEntry> {
        let organisation = Self::organisation(terms.email()?)?;
        first_entry(snapshot, |name| {
            normalize_name(name).replace(' ', "").contains(&organisation)
        })
        .cloned()
    }
}

/// Last seven digits of a phone number
pub struct PhoneSuffix;

impl PhoneSuffix {
    fn suffix(input: &str) -> Option<String> {
        let digits = digits(input);
        (digits.len() >= PHONE_SUFFIX_LEN).then(|| digits[digits.len() - PHONE_SUFFIX_LEN..].to_string())
    }
}

impl MatchStrategy for PhoneSuffix {
    fn method(&self) -> MatchMethod {
        MatchMethod::PhoneSuffix
    }

    fn find(&self, terms: &SearchTerms, snapshot: &DirectorySnapshot) -> Option<DirectoryEntry> {
        let wanted = Self::suffix(terms.phone()?)?;
        snapshot
            .entries()
            .iter()
            .find(|entry| {
                entry
                    .phone
                    .as_deref()
                    .and_then(Self::suffix)
                    .is_some_and(|s| s == wanted)
            })
            .cloned()
    }
}
