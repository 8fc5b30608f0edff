//! Change classification for highlighting.
//!
//! A resolved record can differ from its profile in several ways at once. The
//! category picks one of them for display, by precedence:
//!
//! 1. a note
//! 2. an absence
//! 3. bus and time changed together
//! 4. time changed
//! 5. bus changed
//! 6. nothing

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::locale::{Labels, Locale};
use crate::types::{ChildProfile, ResolvedRecord};

/// Display category of a resolved record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Noted,
    Absent,
    BusAndTimeChanged,
    TimeChanged,
    BusChanged,
    Unchanged,
}

impl Category {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Noted => "NOTED",
            Self::Absent => "ABSENT",
            Self::BusAndTimeChanged => "BUS_AND_TIME_CHANGED",
            Self::TimeChanged => "TIME_CHANGED",
            Self::BusChanged => "BUS_CHANGED",
            Self::Unchanged => "UNCHANGED",
        }
    }

    /// Whether this category stands for a schedule time change.
    #[must_use]
    pub const fn implies_time_change(self) -> bool {
        matches!(self, Self::BusAndTimeChanged | Self::TimeChanged)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category plus the human-readable labels shown next to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    /// "arrival later • departure earlier" style summary; empty when no time changed.
    pub diff_label: String,
    /// Which bus runs apply today; empty when absent or no bus.
    pub bus_label: String,
}

/// Classifies `record` against `profile` using English labels.
pub fn classify(
    record: &ResolvedRecord,
    profile: &ChildProfile,
) -> Result<Classification, ResolveError> {
    classify_localized(record, profile, Locale::En)
}

/// Classifies `record` against `profile` with labels in `locale`.
///
/// # Errors
///
/// [`ResolveError::MismatchedProfile`] when the record belongs to another child.
pub fn classify_localized(
    record: &ResolvedRecord,
    profile: &ChildProfile,
    locale: Locale,
) -> Result<Classification, ResolveError> {
    if record.child_id != profile.id {
        return Err(ResolveError::MismatchedProfile {
            record_child: record.child_id.clone(),
            profile_child: profile.id.clone(),
        });
    }

    let labels = locale.labels();
    let category = category(record, profile);
    let diff_label = if category.implies_time_change() {
        diff_label(record, profile, labels)
    } else {
        String::new()
    };

    Ok(Classification {
        category,
        diff_label,
        bus_label: bus_label(record, labels),
    })
}

fn category(record: &ResolvedRecord, profile: &ChildProfile) -> Category {
    let bus = bus_changed(record, profile);
    let time = time_changed(record, profile);

    if record.has_note() {
        Category::Noted
    } else if record.absent {
        Category::Absent
    } else if bus && time {
        Category::BusAndTimeChanged
    } else if time {
        Category::TimeChanged
    } else if bus {
        Category::BusChanged
    } else {
        Category::Unchanged
    }
}

fn bus_changed(record: &ResolvedRecord, profile: &ChildProfile) -> bool {
    record.bus_morning_today != profile.bus_morning_default
        || record.bus_afternoon_today != profile.bus_afternoon_default
}

fn time_changed(record: &ResolvedRecord, profile: &ChildProfile) -> bool {
    record.is_changed()
        && (!record.effective_in.same_minute(profile.default_in)
            || !record.effective_out.same_minute(profile.default_out))
}

fn diff_label(record: &ResolvedRecord, profile: &ChildProfile, labels: &Labels) -> String {
    if !record.is_changed() {
        return String::new();
    }

    let mut clauses = Vec::with_capacity(2);
    match record.effective_in.cmp_minutes(profile.default_in) {
        Ordering::Less => clauses.push(labels.arrival_earlier),
        Ordering::Greater => clauses.push(labels.arrival_later),
        Ordering::Equal => {}
    }
    match record.effective_out.cmp_minutes(profile.default_out) {
        Ordering::Less => clauses.push(labels.departure_earlier),
        Ordering::Greater => clauses.push(labels.departure_later),
        Ordering::Equal => {}
    }
    clauses.join(labels.diff_separator)
}

fn bus_label(record: &ResolvedRecord, labels: &Labels) -> String {
    if record.absent {
        return String::new();
    }
    match (record.bus_morning_today, record.bus_afternoon_today) {
        (true, true) => labels.bus_both.to_string(),
        (true, false) => labels.bus_morning.to_string(),
        (false, true) => labels.bus_afternoon.to_string(),
        (false, false) => String::new(),
    }
}
