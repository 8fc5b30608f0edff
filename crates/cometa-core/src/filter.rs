//! Filters over resolved records.
//!
//! The presentation layer owns the filter state and passes it in; nothing here
//! is remembered between calls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{ClassroomId, ResolvedRecord, ValidationError};

/// Which classroom to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassroomFilter {
    #[default]
    All,
    Only(ClassroomId),
}

impl FromStr for ClassroomFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            ClassroomId::new(s).map(Self::Only)
        }
    }
}

impl fmt::Display for ClassroomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(id) => write!(f, "{id}"),
        }
    }
}

pub fn by_classroom(record: &ResolvedRecord, classroom: &ClassroomFilter) -> bool {
    match classroom {
        ClassroomFilter::All => true,
        ClassroomFilter::Only(id) => record.classroom_id.as_ref() == Some(id),
    }
}

pub const fn changed_only(record: &ResolvedRecord) -> bool {
    record.is_changed()
}

pub const fn bus_morning_only(record: &ResolvedRecord) -> bool {
    record.bus_morning_today
}

pub const fn bus_afternoon_only(record: &ResolvedRecord) -> bool {
    record.bus_afternoon_today
}

pub const fn absent_only(record: &ResolvedRecord) -> bool {
    record.absent
}

pub fn noted_only(record: &ResolvedRecord) -> bool {
    record.has_note()
}

/// The active set of filters. Every enabled predicate must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub classroom: ClassroomFilter,
    pub changed_only: bool,
    pub bus_morning_only: bool,
    pub bus_afternoon_only: bool,
    pub absent_only: bool,
    pub noted_only: bool,
}

impl RecordFilter {
    /// Whether `record` passes every enabled predicate.
    pub fn matches(&self, record: &ResolvedRecord) -> bool {
        by_classroom(record, &self.classroom)
            && (!self.changed_only || changed_only(record))
            && (!self.bus_morning_only || bus_morning_only(record))
            && (!self.bus_afternoon_only || bus_afternoon_only(record))
            && (!self.absent_only || absent_only(record))
            && (!self.noted_only || noted_only(record))
    }

    /// Keeps the items whose record passes, preserving order.
    pub fn apply<T: AsRef<ResolvedRecord>>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .filter(|item| self.matches(item.as_ref()))
            .collect()
    }
}
