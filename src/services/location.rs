// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fuzzy matching of geocoded place names against the prayer schedule
//! API's province and city lists.

use serde::Serialize;
use strsim::levenshtein;

// Indonesian administrative words. "di " and "kab " can also strip a
// real leading word of a place name.
const PREFIXES: &[&str] = &[
    "provinsi ",
    "province of ",
    "daerah istimewa ",
    "daerah khusus ibukota ",
    "di ",
    "kabupaten ",
    "kab. ",
    "kab ",
    "kota administrasi ",
    "kota ",
    "city of ",
    "regency of ",
];

const SUFFIXES: &[&str] = &[" province", " city", " regency", " district"];

/// Score for one string containing the other.
pub const CONTAINMENT_SCORE: u32 = 90;

/// Best candidate and how well it matched (0-100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationMatch {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("No match for '{0}'")]
    NoMatch(String),
}

/// Lowercase, collapse whitespace, and strip administrative prefixes and
/// suffixes until none remain.
pub fn normalize(name: &str) -> String {
    let mut s = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    loop {
        let before = s.len();
        for prefix in PREFIXES {
            if let Some(rest) = s.strip_prefix(prefix) {
                s = rest.to_string();
            }
        }
        for suffix in SUFFIXES {
            if let Some(rest) = s.strip_suffix(suffix) {
                s = rest.to_string();
            }
        }
        if s.len() == before {
            return s;
        }
    }
}

/// Similarity in 0..=100: equal 100, empty 0, containment 90, otherwise
/// Levenshtein distance scaled by the longer length in characters.
pub fn similarity(a: &str, b: &str) -> u32 {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a.contains(b) || b.contains(a) {
        return CONTAINMENT_SCORE;
    }

    let max_len = a.chars().count().max(b.chars().count());
    let distance = levenshtein(a, b).min(max_len);
    (100 - distance * 100 / max_len) as u32
}

/// Pick the closest candidate. Ties go to the earliest candidate.
pub fn best_match<S: AsRef<str>>(
    detected: &str,
    candidates: &[S],
) -> Result<LocationMatch, LocationError> {
    let wanted = normalize(detected);
    if candidates.is_empty() || wanted.is_empty() {
        return Err(LocationError::NoMatch(detected.to_string()));
    }

    let mut best: Option<LocationMatch> = None;
    for candidate in candidates {
        let score = similarity(&wanted, &normalize(candidate.as_ref()));
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(LocationMatch {
                name: candidate.as_ref().to_string(),
                score,
            });
        }
    }

    best.ok_or_else(|| LocationError::NoMatch(detected.to_string()))
}
