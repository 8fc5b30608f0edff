//! Day command: every active child's effective schedule for one date.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use cometa_core::{ClassroomFilter, DayEntry, Locale, RecordFilter, load_day_view, sort_canonical};
use serde::Serialize;

use crate::Config;
use crate::commands::util::{format_entry, name_width, open_database, parse_date};
use crate::strings::{Strings, strings};

#[derive(Debug, Args)]
pub struct DayArgs {
    /// Date to show: YYYY-MM-DD, today, tomorrow, yesterday, +Nd or -Nd.
    #[arg(short, long, default_value = "today")]
    pub date: String,

    /// Only children in this classroom ID, or "all".
    #[arg(long, default_value = "all")]
    pub classroom: ClassroomFilter,

    /// Only children with a change recorded for the day.
    #[arg(long)]
    pub changed_only: bool,

    /// Only children taking the morning bus.
    #[arg(long)]
    pub bus_morning: bool,

    /// Only children taking the afternoon bus.
    #[arg(long)]
    pub bus_afternoon: bool,

    /// Only absent children.
    #[arg(long)]
    pub absent: bool,

    /// Only children with a note.
    #[arg(long)]
    pub noted: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl DayArgs {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            classroom: self.classroom.clone(),
            changed_only: self.changed_only,
            bus_morning_only: self.bus_morning,
            bus_afternoon_only: self.bus_afternoon,
            absent_only: self.absent,
            noted_only: self.noted,
        }
    }
}

#[derive(Debug, Serialize)]
struct DayOutput<'a> {
    date: NaiveDate,
    entries: &'a [DayEntry],
}

pub fn run<W: Write>(writer: &mut W, args: &DayArgs, config: &Config) -> Result<()> {
    run_at(writer, args, config, Local::now().date_naive())
}

/// Like [`run`], with relative dates counted from `today`.
pub fn run_at<W: Write>(
    writer: &mut W,
    args: &DayArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let date = parse_date(&args.date, today)?;
    let db = open_database(config)?;

    let entries = load_day_view(&db, date, config.locale)
        .with_context(|| format!("failed to resolve schedules for {date}"))?;
    let mut entries = args.filter().apply(entries);
    sort_canonical(&mut entries);
    tracing::debug!(%date, shown = entries.len(), "day view ready");

    if args.json {
        let output = DayOutput {
            date,
            entries: &entries,
        };
        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)?;
    } else {
        write!(writer, "{}", format_day(date, &entries, config.locale))?;
    }
    Ok(())
}

/// Renders a day view already filtered and in canonical order.
pub fn format_day(date: NaiveDate, entries: &[DayEntry], locale: Locale) -> String {
    let strings = strings(locale);
    let mut output = String::new();

    writeln!(output, "{} {}", strings.day_title, day_heading(date, strings)).unwrap();
    if entries.is_empty() {
        writeln!(output, "{}", strings.no_children_today).unwrap();
        return output;
    }

    let width = name_width(entries);
    for entry in entries {
        writeln!(output, "{}", format_entry(entry, width, locale)).unwrap();
    }
    writeln!(output, "{}", counts_line(entries, strings)).unwrap();
    output
}

/// "Fri 2024-03-01" style heading for a date.
pub fn day_heading(date: NaiveDate, strings: &Strings) -> String {
    let weekday = strings.weekdays[date.weekday().num_days_from_monday() as usize];
    format!("{weekday} {date}")
}

/// "changed: 2, noted: 1, absent: 1" over `entries`.
pub fn counts_line(entries: &[DayEntry], strings: &Strings) -> String {
    let changed = entries.iter().filter(|e| e.record.is_changed()).count();
    let noted = entries.iter().filter(|e| e.record.has_note()).count();
    let absent = entries.iter().filter(|e| e.record.absent).count();
    format!(
        "{}: {changed}, {}: {noted}, {}: {absent}",
        strings.changed, strings.noted, strings.absent_count
    )
}
