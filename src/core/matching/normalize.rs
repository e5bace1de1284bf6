//! Name normalization and search-term preparation

use crate::domain::RawExtractedRecord;

/// Words ignored by the significant-token strategy
const STOPWORDS: &[&str] = &[
    "the", "and", "of", "for", "inc", "llc", "ltd", "corp", "corporation", "company", "co",
    "foundation", "trust", "church", "family", "fund", "mr", "mrs", "ms", "miss", "dr", "rev",
    "sir", "jr", "sr", "ii", "iii", "iv", "estate", "with", "from",
];

/// Lowercase, drop punctuation, collapse whitespace
///
/// Hyphens, slashes and underscores separate words; other punctuation is
/// removed, so `O'Brien` becomes `obrien`.
pub fn normalize_name(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            cleaned.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || matches!(ch, '-' | '/' | '_' | '&' | '+') {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized tokens
pub fn tokens(input: &str) -> Vec<String> {
    normalize_name(input)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The other word order of a personal name, normalized
///
/// `"Smith, John A"` becomes `"john a smith"`; `"John A Smith"` becomes
/// `"smith john a"`. Single-token names have no swap.
pub fn swapped_form(input: &str) -> Option<String> {
    if let Some((last, first)) = input.split_once(',') {
        let first = normalize_name(first);
        let last = normalize_name(last);
        if first.is_empty() || last.is_empty() {
            return None;
        }
        return Some(format!("{first} {last}"));
    }

    let mut parts = tokens(input);
    if parts.len() < 2 {
        return None;
    }
    let last = parts.pop()?;
    parts.insert(0, last);
    Some(parts.join(" "))
}

/// Surname token: the part before a comma, otherwise the last token
pub fn surname(input: &str) -> Option<String> {
    match input.split_once(',') {
        Some((last, _)) => tokens(last).pop(),
        None => tokens(input).pop(),
    }
}

/// True for stopwords and honorifics
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Digits only
pub fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Input that is mostly a phone number: at least 7 digits making up at least
/// 70% of the non-space characters
pub fn is_numeric_like(input: &str) -> bool {
    let non_space = input.chars().filter(|c| !c.is_whitespace()).count();
    let digit_count = input.chars().filter(char::is_ascii_digit).count();
    digit_count >= 7 && digit_count * 10 >= non_space * 7
}

/// What the matcher searches with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    text: String,
    normalized: String,
    email: Option<String>,
    phone: Option<String>,
}

impl SearchTerms {
    /// Terms from free text; an `@` in the text also supplies the email
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into().trim().to_string();
        let email = text
            .split_whitespace()
            .find(|w| w.contains('@'))
            .map(|w| w.trim_matches(|c: char| c == '<' || c == '>' || c == ',').to_string());
        let phone = is_numeric_like(&text).then(|| text.clone());
        Self {
            normalized: normalize_name(&text),
            text,
            email,
            phone,
        }
    }

    /// Sets the email when present and non-blank
    pub fn with_email(mut self, email: Option<&str>) -> Self {
        if let Some(e) = email.map(str::trim).filter(|e| e.contains('@')) {
            self.email = Some(e.to_string());
        }
        self
    }

    /// Sets the phone when present and non-blank
    pub fn with_phone(mut self, phone: Option<&str>) -> Self {
        if let Some(p) = phone.map(str::trim).filter(|p| !p.is_empty()) {
            self.phone = Some(p.to_string());
        }
        self
    }

    /// Terms for an extracted record: donor name, email and phone
    pub fn from_record(record: &RawExtractedRecord) -> Self {
        Self::new(record.donor_name.clone().unwrap_or_default())
            .with_email(record.email.as_deref())
            .with_phone(record.phone.as_deref())
    }

    /// Original text, trimmed
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Nothing to search with
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty() && self.email.is_none() && self.phone.is_none()
    }

    /// Key under which a resolved match is remembered
    pub fn alias_key(&self) -> String {
        if !self.text.is_empty() {
            return self.text.clone();
        }
        self.email
            .clone()
            .or_else(|| self.phone.clone())
            .unwrap_or_default()
    }
}
