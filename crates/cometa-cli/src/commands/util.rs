//! Shared utilities for CLI commands.

use std::fmt::Write;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::{Days, NaiveDate};
use clap::ValueEnum;
use cometa_core::{Category, ChildId, DayEntry, Locale, StaffId, TimeOfDay};
use cometa_db::Database;
use regex::Regex;

use crate::Config;
use crate::strings::strings;

/// Pre-compiled regex for relative dates such as `+2d` or `-1`.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])(\d+)d?$").unwrap());

/// Conservative bound for relative dates (~10 years).
const MAX_RELATIVE_DAYS: u64 = 3660;

/// Opens the configured database, creating its directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }
    }
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok(db.with_read_back(config.read_back_policy()))
}

/// Parse a date as ISO 8601 or relative to `today`.
///
/// Supports:
/// - ISO 8601: "2024-03-01"
/// - Named: "today", "tomorrow", "yesterday" (and "hoy", "mañana", "ayer")
/// - Relative: "+2d", "-1d", "+3"
pub fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = s.trim();
    match s.to_lowercase().as_str() {
        "today" | "hoy" => return Ok(today),
        "tomorrow" | "mañana" => return offset(today, '+', 1),
        "yesterday" | "ayer" => return offset(today, '-', 1),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        bail!("Invalid date: {s}. Use YYYY-MM-DD, today, tomorrow, yesterday, or +N/-N days");
    };

    let n: u64 = caps[2]
        .parse()
        .context("failed to parse number in relative date")?;
    if n > MAX_RELATIVE_DAYS {
        bail!("Relative date too far away: {n} days");
    }
    let sign = caps[1].chars().next().unwrap_or('+');
    offset(today, sign, n)
}

fn offset(today: NaiveDate, sign: char, days: u64) -> Result<NaiveDate> {
    let shifted = if sign == '-' {
        today.checked_sub_days(Days::new(days))
    } else {
        today.checked_add_days(Days::new(days))
    };
    shifted.with_context(|| format!("date out of range: {today} {sign}{days}d"))
}

/// Parse a time flag, naming the flag on failure.
pub fn parse_time(field: &'static str, value: &str) -> Result<TimeOfDay> {
    Ok(TimeOfDay::parse(field, value)?)
}

pub fn parse_child_id(value: &str) -> Result<ChildId> {
    ChildId::new(value).context("invalid child ID")
}

/// The staff member to attribute a change to: `--by`, then the configured ID.
pub fn staff_id(config: &Config, by: Option<&str>) -> Result<StaffId> {
    let Some(id) = by.or(config.staff_id.as_deref()) else {
        bail!("no staff identity: pass --by or set staff_id in the configuration");
    };
    StaffId::new(id).context("invalid staff ID")
}

/// A bus run override given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BusChoice {
    /// Takes the bus this day.
    #[value(name = "true", alias = "yes")]
    Yes,
    /// Does not take the bus this day.
    #[value(name = "false", alias = "no")]
    No,
    /// Follows the child's default.
    Default,
}

impl BusChoice {
    /// The stored override; `None` means "keep the default".
    pub const fn as_override(self) -> Option<bool> {
        match self {
            Self::Yes => Some(true),
            Self::No => Some(false),
            Self::Default => None,
        }
    }
}

/// Formats one resolved record as a single line.
///
/// `width` pads the name column so rows line up.
pub fn format_entry(entry: &DayEntry, width: usize, locale: Locale) -> String {
    let strings = strings(locale);
    let record = &entry.record;
    let classification = &entry.classification;
    let marker = match classification.category {
        Category::Noted => '✎',
        Category::Absent => '✗',
        Category::Unchanged => ' ',
        Category::BusAndTimeChanged | Category::TimeChanged | Category::BusChanged => '*',
    };

    let mut line = String::new();
    write!(
        line,
        "{marker} {:<width$}  {}-{}",
        record.name, record.effective_in, record.effective_out
    )
    .unwrap();
    if record.absent {
        write!(line, "  {}", strings.absent).unwrap();
    }
    if !classification.bus_label.is_empty() {
        write!(line, "  {}: {}", strings.bus, classification.bus_label).unwrap();
    }
    if !classification.diff_label.is_empty() {
        write!(line, "  [{}]", classification.diff_label).unwrap();
    }
    if let Some(note) = record.note.as_deref().filter(|_| record.has_note()) {
        write!(line, "  {}: {}", strings.note, note.trim()).unwrap();
    }
    line
}

/// Width of the widest name, in characters.
pub fn name_width(entries: &[DayEntry]) -> usize {
    entries
        .iter()
        .map(|entry| entry.record.name.chars().count())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parse_date_named_days() {
        let today = day("2024-03-01");
        assert_eq!(parse_date("today", today).unwrap(), today);
        assert_eq!(parse_date("Hoy", today).unwrap(), today);
        assert_eq!(parse_date("tomorrow", today).unwrap(), day("2024-03-02"));
        assert_eq!(parse_date("ayer", today).unwrap(), day("2024-02-29"));
    }

    #[test]
    fn parse_date_iso_and_relative() {
        let today = day("2024-03-01");
        assert_eq!(parse_date("2024-12-24", today).unwrap(), day("2024-12-24"));
        assert_eq!(parse_date("+3d", today).unwrap(), day("2024-03-04"));
        assert_eq!(parse_date("-1", today).unwrap(), day("2024-02-29"));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let today = day("2024-03-01");
        assert!(parse_date("next friday", today).is_err());
        assert!(parse_date("2024-02-30", today).is_err());
        assert!(parse_date("+99999d", today).is_err());
    }

    #[test]
    fn parse_time_names_the_flag() {
        let err = parse_time("--in", "8h").unwrap_err();
        assert!(err.to_string().contains("--in"));
        assert_eq!(parse_time("--in", "08:30").unwrap().to_string(), "08:30");
    }

    #[test]
    fn staff_id_prefers_flag_over_config() {
        let mut config = Config::default();
        assert!(staff_id(&config, None).is_err());

        config.staff_id = Some("marta".to_string());
        assert_eq!(staff_id(&config, None).unwrap().as_str(), "marta");
        assert_eq!(staff_id(&config, Some("pablo")).unwrap().as_str(), "pablo");
    }

    #[test]
    fn bus_choice_overrides() {
        assert_eq!(BusChoice::Yes.as_override(), Some(true));
        assert_eq!(BusChoice::No.as_override(), Some(false));
        assert_eq!(BusChoice::Default.as_override(), None);
    }
}
