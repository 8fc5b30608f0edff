//! History command: every change recorded for one child.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;
use cometa_core::{Exception, Locale};

use crate::Config;
use crate::commands::day::day_heading;
use crate::commands::util::{open_database, parse_child_id};
use crate::strings::strings;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Child ID.
    #[arg(long)]
    pub child: String,
}

pub fn run<W: Write>(writer: &mut W, args: &HistoryArgs, config: &Config) -> Result<()> {
    let child_id = parse_child_id(&args.child)?;
    let db = open_database(config)?;
    let Some(child) = db.find_child(&child_id)? else {
        bail!("child not found: {child_id}");
    };

    let exceptions = db.list_exceptions_for_child(&child_id)?;
    writeln!(writer, "{}", child.name)?;
    if exceptions.is_empty() {
        writeln!(writer, "{}", strings(config.locale).no_changes)?;
        return Ok(());
    }
    for exception in &exceptions {
        writeln!(writer, "{}", format_exception(exception, config.locale))?;
    }
    Ok(())
}

/// "<id>  Fri 2024-03-01  In 08:30, Bus afternoon ✓  (marta)"
pub fn format_exception(exception: &Exception, locale: Locale) -> String {
    let strings = strings(locale);
    let labels = locale.labels();

    let mut details = Vec::new();
    if let Some(new_in) = exception.new_in {
        details.push(format!("{} {new_in}", strings.arrive));
    }
    if let Some(new_out) = exception.new_out {
        details.push(format!("{} {new_out}", strings.leave));
    }
    if let Some(rides) = exception.bus_morning_override {
        details.push(format!("{} {} {}", strings.bus, labels.bus_morning, tick(rides)));
    }
    if let Some(rides) = exception.bus_afternoon_override {
        details.push(format!("{} {} {}", strings.bus, labels.bus_afternoon, tick(rides)));
    }
    if exception.absent {
        details.push(strings.absent.to_string());
    }
    if let Some(note) = exception.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        details.push(format!("{}: {note}", strings.note));
    }
    let details = if details.is_empty() {
        "-".to_string()
    } else {
        details.join(", ")
    };

    format!(
        "{}  {}  {details}  ({})",
        exception.id,
        day_heading(exception.date, strings),
        exception.created_by
    )
}

const fn tick(rides: bool) -> char {
    if rides { '✓' } else { '✗' }
}
