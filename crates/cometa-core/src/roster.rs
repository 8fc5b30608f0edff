//! Resolution of a whole roster for one or more dates.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use crate::classify::{Classification, classify_localized};
use crate::error::ResolveError;
use crate::locale::Locale;
use crate::resolve::resolve;
use crate::types::{ChildId, ChildProfile, Exception, ResolvedRecord};

/// Read access to the roster.
///
/// Implemented by the store; the engine never loads anything itself.
pub trait RosterSource {
    type Error;

    /// Children currently enrolled.
    fn active_children(&self) -> Result<Vec<ChildProfile>, Self::Error>;
}

/// Read access to recorded exceptions.
pub trait ExceptionSource {
    type Error;

    /// Every exception recorded for `date`, duplicates included.
    fn exceptions_for_date(&self, date: NaiveDate) -> Result<Vec<Exception>, Self::Error>;
}

/// A resolved record paired with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEntry {
    pub record: ResolvedRecord,
    pub classification: Classification,
}

impl AsRef<ResolvedRecord> for DayEntry {
    fn as_ref(&self) -> &ResolvedRecord {
        &self.record
    }
}

impl AsRef<Self> for ResolvedRecord {
    fn as_ref(&self) -> &Self {
        self
    }
}

/// Resolves every active child in `profiles` for `date`.
///
/// Exceptions whose child is not among the active profiles are ignored.
/// Output order is unspecified; see [`crate::sort_canonical`].
///
/// # Errors
///
/// - [`ResolveError::MultipleExceptions`] when two exceptions share an active child.
/// - [`ResolveError::MismatchedException`] when an exception is for another date.
pub fn resolve_roster(
    profiles: &[ChildProfile],
    exceptions_for_date: &[Exception],
    date: NaiveDate,
) -> Result<Vec<ResolvedRecord>, ResolveError> {
    let lookup = index_exceptions(profiles, exceptions_for_date, date)?;

    profiles
        .iter()
        .filter(|profile| profile.active)
        .map(|profile| resolve(profile, lookup.get(&profile.id).copied(), date))
        .collect()
}

/// Resolves and classifies the roster for `date`.
///
/// This is the view behind both the "today" and the "by date" screens.
pub fn day_view(
    profiles: &[ChildProfile],
    exceptions_for_date: &[Exception],
    date: NaiveDate,
    locale: Locale,
) -> Result<Vec<DayEntry>, ResolveError> {
    let lookup = index_exceptions(profiles, exceptions_for_date, date)?;

    profiles
        .iter()
        .filter(|profile| profile.active)
        .map(|profile| {
            let record = resolve(profile, lookup.get(&profile.id).copied(), date)?;
            let classification = classify_localized(&record, profile, locale)?;
            Ok(DayEntry {
                record,
                classification,
            })
        })
        .collect()
}

/// Loads both sources and builds the day view for `date`.
pub fn load_day_view<S, E>(
    source: &S,
    date: NaiveDate,
    locale: Locale,
) -> Result<Vec<DayEntry>, E>
where
    S: RosterSource<Error = E> + ExceptionSource<Error = E>,
    E: From<ResolveError>,
{
    let profiles = source.active_children()?;
    let exceptions = source.exceptions_for_date(date)?;
    Ok(day_view(&profiles, &exceptions, date, locale)?)
}

/// Builds the day view for each of `dates`, in parallel.
///
/// `exceptions` may span any dates; each is routed to its own date and those
/// outside `dates` are ignored. Results follow the order of `dates`.
pub fn resolve_range(
    profiles: &[ChildProfile],
    exceptions: &[Exception],
    dates: &[NaiveDate],
    locale: Locale,
) -> Result<Vec<(NaiveDate, Vec<DayEntry>)>, ResolveError> {
    let mut by_date: HashMap<NaiveDate, Vec<Exception>> = HashMap::new();
    for exception in exceptions {
        by_date
            .entry(exception.date)
            .or_default()
            .push(exception.clone());
    }

    dates
        .par_iter()
        .map(|&date| {
            let for_date = by_date.get(&date).map_or(&[][..], Vec::as_slice);
            day_view(profiles, for_date, date, locale).map(|entries| (date, entries))
        })
        .collect()
}

/// Maps each active child to its exception for `date`.
///
/// Exceptions of inactive or unknown children are set aside before duplicates
/// are looked for, so they can never fail the roster.
fn index_exceptions<'e>(
    profiles: &[ChildProfile],
    exceptions: &'e [Exception],
    date: NaiveDate,
) -> Result<HashMap<&'e ChildId, &'e Exception>, ResolveError> {
    let active: HashSet<&ChildId> = profiles
        .iter()
        .filter(|profile| profile.active)
        .map(|profile| &profile.id)
        .collect();
    let (rostered, orphans): (Vec<&Exception>, Vec<&Exception>) = exceptions
        .iter()
        .partition(|exception| active.contains(&exception.child_id));
    log_orphans(&orphans, date);

    let mut lookup: HashMap<&ChildId, &Exception> = HashMap::with_capacity(rostered.len());
    for &exception in &rostered {
        match lookup.entry(&exception.child_id) {
            Entry::Vacant(slot) => {
                slot.insert(exception);
            }
            Entry::Occupied(_) => {
                let exception_ids = rostered
                    .iter()
                    .filter(|e| e.child_id == exception.child_id)
                    .map(|e| e.id.clone())
                    .collect();
                return Err(ResolveError::MultipleExceptions {
                    child_id: exception.child_id.clone(),
                    date,
                    exception_ids,
                });
            }
        }
    }
    Ok(lookup)
}

fn log_orphans(orphans: &[&Exception], date: NaiveDate) {
    for exception in orphans {
        tracing::debug!(
            child_id = %exception.child_id,
            exception_id = %exception.id,
            %date,
            "ignoring exception without an active child"
        );
    }
}
