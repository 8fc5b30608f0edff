//! Errors raised by the resolution engine.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{ChildId, ExceptionId};

/// Structural inconsistencies the engine refuses to paper over.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// An exception was paired with the wrong child or date.
    #[error(
        "exception {exception_id} is for child {exception_child} on {exception_date}, \
         not child {child_id} on {date}"
    )]
    MismatchedException {
        exception_id: ExceptionId,
        exception_child: ChildId,
        exception_date: NaiveDate,
        child_id: ChildId,
        date: NaiveDate,
    },

    /// A resolved record was classified against another child's profile.
    #[error("record for child {record_child} cannot be classified against profile {profile_child}")]
    MismatchedProfile {
        record_child: ChildId,
        profile_child: ChildId,
    },

    /// More than one exception exists for the same child and date.
    #[error(
        "{} exceptions recorded for child {child_id} on {date}: {}",
        .exception_ids.len(),
        join_ids(.exception_ids)
    )]
    MultipleExceptions {
        child_id: ChildId,
        date: NaiveDate,
        exception_ids: Vec<ExceptionId>,
    },

    /// A time value could not be parsed.
    #[error("invalid time for {field}: {value:?} (expected HH:MM or HH:MM:SS)")]
    InvalidTimeFormat { field: &'static str, value: String },
}

fn join_ids(ids: &[ExceptionId]) -> String {
    ids.iter()
        .map(ExceptionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
