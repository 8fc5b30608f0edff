//! Attendance resolution engine.
//!
//! Given a child's default schedule and the exception (if any) staff recorded
//! for a date, this crate computes:
//! - Resolution: the effective arrival, departure, bus and absence for the date
//! - Classification: what changed, for highlighting
//! - Roster views: the above across every active child, filtered and ordered
//!
//! Everything here is a pure function of its arguments. Loading and storing
//! profiles and exceptions is left to the caller.

mod classify;
mod error;
pub mod filter;
pub mod locale;
mod order;
mod resolve;
mod roster;
mod types;

#[cfg(test)]
mod test_support;

pub use classify::{Category, Classification, classify, classify_localized};
pub use error::ResolveError;
pub use filter::{ClassroomFilter, RecordFilter};
pub use locale::Locale;
pub use order::{CollationKey, canonical_cmp, compare_names, sort_canonical};
pub use resolve::resolve;
pub use roster::{
    DayEntry, ExceptionSource, RosterSource, day_view, load_day_view, resolve_range,
    resolve_roster,
};
pub use types::{
    ChildId, ChildProfile, ClassroomId, Exception, ExceptionId, ResolvedRecord, StaffId,
    TimeOfDay, ValidationError,
};
