//! Week command: Monday-to-Friday change counts.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Datelike, Days, Local, NaiveDate};
use clap::Args;
use cometa_core::{DayEntry, Locale, resolve_range, sort_canonical};
use serde::Serialize;

use crate::Config;
use crate::commands::day::day_heading;
use crate::commands::util::{open_database, parse_date};
use crate::strings::strings;

const SCHOOL_DAYS: usize = 5;

#[derive(Debug, Args)]
pub struct WeekArgs {
    /// Any date in the week to show.
    #[arg(short, long, default_value = "today")]
    pub date: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// One school day of the week summary.
#[derive(Debug, Serialize)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub changed: usize,
    pub noted: usize,
    pub absent: usize,
    pub entries: Vec<DayEntry>,
}

impl WeekDay {
    fn new(date: NaiveDate, mut entries: Vec<DayEntry>) -> Self {
        sort_canonical(&mut entries);
        Self {
            date,
            changed: entries.iter().filter(|e| e.record.is_changed()).count(),
            noted: entries.iter().filter(|e| e.record.has_note()).count(),
            absent: entries.iter().filter(|e| e.record.absent).count(),
            entries,
        }
    }
}

pub fn run<W: Write>(writer: &mut W, args: &WeekArgs, config: &Config) -> Result<()> {
    run_at(writer, args, config, Local::now().date_naive())
}

/// Like [`run`], with relative dates counted from `today`.
pub fn run_at<W: Write>(
    writer: &mut W,
    args: &WeekArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let date = parse_date(&args.date, today)?;
    let dates = school_days(date)?;
    let (first, last) = (dates[0], dates[SCHOOL_DAYS - 1]);

    let db = open_database(config)?;
    let profiles = db.list_children(false)?;
    let exceptions = db.list_exceptions_between(first, last)?;
    tracing::debug!(%first, %last, children = profiles.len(), exceptions = exceptions.len(), "resolving week");

    let days: Vec<WeekDay> = resolve_range(&profiles, &exceptions, &dates, config.locale)
        .with_context(|| format!("failed to resolve schedules for {first}..{last}"))?
        .into_iter()
        .map(|(date, entries)| WeekDay::new(date, entries))
        .collect();

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &days)?;
        writeln!(writer)?;
    } else {
        write!(writer, "{}", format_week(&days, config.locale))?;
    }
    Ok(())
}

/// Monday to Friday of the week containing `date`.
fn school_days(date: NaiveDate) -> Result<Vec<NaiveDate>> {
    let monday = date
        .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .context("date out of range")?;
    let days: Vec<NaiveDate> = monday.iter_days().take(SCHOOL_DAYS).collect();
    if days.len() < SCHOOL_DAYS {
        anyhow::bail!("date out of range: {date}");
    }
    Ok(days)
}

pub fn format_week(days: &[WeekDay], locale: Locale) -> String {
    let strings = strings(locale);
    let mut output = String::new();

    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        writeln!(output, "{} {} - {}", strings.week_title, first.date, last.date).unwrap();
    }
    for day in days {
        writeln!(
            output,
            "{}  {}: {}, {}: {}, {}: {}",
            day_heading(day.date, strings),
            strings.changed,
            day.changed,
            strings.noted,
            day.noted,
            strings.absent_count,
            day.absent
        )
        .unwrap();
    }
    output
}
