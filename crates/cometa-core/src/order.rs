//! Canonical presentation order for resolved records.
//!
//! Records with an exception come first. Within each group records are
//! ordered by effective arrival (minute granularity), then by name using
//! Spanish collation, then by child ID so the order is total.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::types::{ChildId, ResolvedRecord};

const COMBINING_TILDE: char = '\u{303}';

/// Sort key for a name under Spanish, case-insensitive collation.
///
/// Levels, compared in order:
/// 1. base letters, lowercased, accents dropped, `ñ` as its own letter after `n`
/// 2. accents
/// 3. case and anything else, by code point
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    primary: Vec<char>,
    secondary: String,
    tertiary: String,
}

impl CollationKey {
    pub fn new(name: &str) -> Self {
        let trimmed = name.trim();
        let decomposed: String = trimmed.nfd().flat_map(char::to_lowercase).collect();

        let mut primary = Vec::with_capacity(decomposed.len());
        for c in decomposed.chars() {
            if c == COMBINING_TILDE && primary.last() == Some(&'n') {
                primary.push(char::MAX);
            } else if !is_combining_mark(c) {
                primary.push(c);
            }
        }

        Self {
            primary,
            secondary: decomposed,
            tertiary: trimmed.to_string(),
        }
    }
}

/// Compares two names under Spanish, case-insensitive collation.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

type CanonicalKey = (bool, u32, CollationKey, ChildId);

fn canonical_key(record: &ResolvedRecord) -> CanonicalKey {
    (
        !record.is_changed(),
        record.effective_in.minute_of_day(),
        CollationKey::new(&record.name),
        record.child_id.clone(),
    )
}

/// The one ordering used wherever roster records are displayed.
pub fn canonical_cmp(a: &ResolvedRecord, b: &ResolvedRecord) -> Ordering {
    canonical_key(a).cmp(&canonical_key(b))
}

/// Sorts records (or anything wrapping one) into canonical order.
pub fn sort_canonical<T: AsRef<ResolvedRecord>>(items: &mut [T]) {
    items.sort_by_cached_key(|item| canonical_key(item.as_ref()));
}
