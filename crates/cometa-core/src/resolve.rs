//! Merging a default profile with a date's exception.

use chrono::NaiveDate;

use crate::error::ResolveError;
use crate::types::{ChildProfile, Exception, ResolvedRecord};

/// Computes the effective schedule of one child on `date`.
///
/// Every override field left as `None` in `exception` inherits the profile
/// default. Without an exception the record is the profile's defaults, not
/// absent, with no note.
///
/// # Errors
///
/// [`ResolveError::MismatchedException`] when `exception` belongs to another
/// child or another date.
pub fn resolve(
    profile: &ChildProfile,
    exception: Option<&Exception>,
    date: NaiveDate,
) -> Result<ResolvedRecord, ResolveError> {
    if let Some(exception) = exception {
        if exception.child_id != profile.id || exception.date != date {
            return Err(ResolveError::MismatchedException {
                exception_id: exception.id.clone(),
                exception_child: exception.child_id.clone(),
                exception_date: exception.date,
                child_id: profile.id.clone(),
                date,
            });
        }
    }

    Ok(ResolvedRecord {
        child_id: profile.id.clone(),
        name: profile.name.clone(),
        classroom_id: profile.classroom_id.clone(),
        effective_in: exception
            .and_then(|e| e.new_in)
            .unwrap_or(profile.default_in),
        effective_out: exception
            .and_then(|e| e.new_out)
            .unwrap_or(profile.default_out),
        bus_morning_today: exception
            .and_then(|e| e.bus_morning_override)
            .unwrap_or(profile.bus_morning_default),
        bus_afternoon_today: exception
            .and_then(|e| e.bus_afternoon_override)
            .unwrap_or(profile.bus_afternoon_default),
        absent: exception.is_some_and(|e| e.absent),
        note: exception.and_then(|e| e.note.clone()),
        exception_id: exception.map(|e| e.id.clone()),
        date,
    })
}
