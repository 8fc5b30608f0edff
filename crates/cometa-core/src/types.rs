//! Core type definitions with validation.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ResolveError;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated child identifier.
    ChildId, "child ID"
);

define_string_id!(
    /// A validated classroom identifier.
    ClassroomId, "classroom ID"
);

define_string_id!(
    /// A validated exception identifier.
    ///
    /// Uniqueness is enforced by the exception store, not here.
    ExceptionId, "exception ID"
);

define_string_id!(
    /// Identifies the staff member who recorded a change.
    StaffId, "staff ID"
);

/// A time of day as written on a schedule.
///
/// Defaults are often stored as `HH:MM:SS` while overrides are typed as
/// `HH:MM`. Comparisons made by the engine go through [`TimeOfDay::cmp_minutes`]
/// and [`TimeOfDay::same_minute`], which ignore seconds. The full value is kept
/// so it can be displayed the way it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    time: NaiveTime,
    with_seconds: bool,
}

impl TimeOfDay {
    /// Parses `HH:MM` or `HH:MM:SS`.
    ///
    /// `field` names the value being parsed so the error can point at it.
    pub fn parse(field: &'static str, value: &str) -> Result<Self, ResolveError> {
        let trimmed = value.trim();
        let invalid = || ResolveError::InvalidTimeFormat {
            field,
            value: value.to_string(),
        };

        match trimmed.matches(':').count() {
            1 => NaiveTime::parse_from_str(trimmed, "%H:%M")
                .map(|time| Self {
                    time,
                    with_seconds: false,
                })
                .map_err(|_| invalid()),
            2 => NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
                .map(|time| Self {
                    time,
                    with_seconds: true,
                })
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    /// Builds a minute-precision time, or `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|time| Self {
            time,
            with_seconds: false,
        })
    }

    /// Minutes since midnight, seconds discarded.
    #[must_use]
    pub fn minute_of_day(self) -> u32 {
        self.time.hour() * 60 + self.time.minute()
    }

    /// Orders two times at minute granularity.
    #[must_use]
    pub fn cmp_minutes(self, other: Self) -> Ordering {
        self.minute_of_day().cmp(&other.minute_of_day())
    }

    /// Whether both times fall on the same minute.
    #[must_use]
    pub fn same_minute(self, other: Self) -> bool {
        self.minute_of_day() == other.minute_of_day()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.with_seconds {
            write!(f, "{}", self.time.format("%H:%M:%S"))
        } else {
            write!(f, "{}", self.time.format("%H:%M"))
        }
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse("time", &value)
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

/// A child's standing schedule, as held by the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub id: ChildId,
    pub name: String,
    pub classroom_id: Option<ClassroomId>,
    pub default_in: TimeOfDay,
    pub default_out: TimeOfDay,
    pub bus_morning_default: bool,
    pub bus_afternoon_default: bool,
    pub active: bool,
}

/// A one-off override of a child's schedule for a single date.
///
/// `None` on any override field means "keep the default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    pub id: ExceptionId,
    pub child_id: ChildId,
    pub date: NaiveDate,
    pub new_in: Option<TimeOfDay>,
    pub new_out: Option<TimeOfDay>,
    pub bus_morning_override: Option<bool>,
    pub bus_afternoon_override: Option<bool>,
    #[serde(default)]
    pub absent: bool,
    pub note: Option<String>,
    pub created_by: StaffId,
}

/// The effective schedule for one child on one date.
///
/// Built fresh by [`crate::resolve`] on every call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub child_id: ChildId,
    pub name: String,
    pub classroom_id: Option<ClassroomId>,
    pub effective_in: TimeOfDay,
    pub effective_out: TimeOfDay,
    pub bus_morning_today: bool,
    pub bus_afternoon_today: bool,
    pub absent: bool,
    pub note: Option<String>,
    pub exception_id: Option<ExceptionId>,
    pub date: NaiveDate,
}

impl ResolvedRecord {
    /// Whether a non-blank note applies to this record.
    #[must_use]
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|note| !note.trim().is_empty())
    }

    /// Whether an exception was applied.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.exception_id.is_some()
    }
}
