//! Sequence similarity scoring
//!
//! Ratcliff/Obershelp: find the longest common substring, recurse on both
//! sides, and report `2 * matched / (len(a) + len(b))`.

use super::normalize::{normalize_name, surname, swapped_form};
use crate::domain::DirectoryEntry;

/// Added when the surnames agree
pub const SURNAME_BONUS: f64 = 0.10;

/// Ratcliff/Obershelp ratio in `[0, 1]`; two empty strings score 1
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (i, j, len) = longest_common_substring(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// (start in a, start in b, length), earliest on ties
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            if row[j + 1] > best.2 {
                best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }
    best
}

/// Every normalized form of a name: as written and word-swapped
fn forms(name: &str) -> Vec<String> {
    let mut forms = vec![normalize_name(name)];
    if let Some(swapped) = swapped_form(name) {
        if !forms.contains(&swapped) {
            forms.push(swapped);
        }
    }
    forms.retain(|f| !f.is_empty());
    forms
}

/// Best similarity of `search` against any name form of `entry`, plus the
/// surname bonus, capped at 1
pub fn score_entry(search: &str, entry: &DirectoryEntry) -> f64 {
    let search_forms = forms(search);
    if search_forms.is_empty() {
        return 0.0;
    }
    let search_surname = surname(search);

    entry
        .names()
        .map(|name| {
            let best = forms(name)
                .iter()
                .flat_map(|candidate| search_forms.iter().map(move |s| ratio(s, candidate)))
                .fold(0.0_f64, f64::max);

            let bonus = match (&search_surname, surname(name)) {
                (Some(a), Some(b)) if *a == b => SURNAME_BONUS,
                _ => 0.0,
            };
            (best + bonus).min(1.0)
        })
        .fold(0.0_f64, f64::max)
}
