//! Change, edit and revert commands for per-day schedule exceptions.
//!
//! Every write is followed by a fresh resolution of the affected day, and the
//! child's resolved line is printed from that.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::Args;
use cometa_core::{ChildId, ExceptionId, load_day_view};
use cometa_db::{Database, ExceptionPatch, NewException};

use crate::Config;
use crate::commands::util::{
    BusChoice, format_entry, open_database, parse_child_id, parse_date, parse_time, staff_id,
};
use crate::strings::strings;

#[derive(Debug, Args)]
pub struct ChangeArgs {
    /// Child ID.
    #[arg(long)]
    pub child: String,

    /// Date of the change: YYYY-MM-DD, today, tomorrow, yesterday, +Nd or -Nd.
    #[arg(short, long, default_value = "today")]
    pub date: String,

    /// Arrival time for the day.
    #[arg(long = "in", value_name = "HH:MM")]
    pub arrive: Option<String>,

    /// Departure time for the day.
    #[arg(long = "out", value_name = "HH:MM")]
    pub leave: Option<String>,

    /// Morning bus for the day.
    #[arg(long, value_enum)]
    pub bus_morning: Option<BusChoice>,

    /// Afternoon bus for the day.
    #[arg(long, value_enum)]
    pub bus_afternoon: Option<BusChoice>,

    /// Mark the child absent.
    #[arg(long)]
    pub absent: bool,

    /// Free-text note for the day.
    #[arg(long)]
    pub note: Option<String>,

    /// Staff ID recorded as the author (defaults to the configured one).
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Change ID, as shown by `history`.
    pub id: String,

    /// New arrival time.
    #[arg(long = "in", value_name = "HH:MM", conflicts_with = "keep_in")]
    pub arrive: Option<String>,

    /// New departure time.
    #[arg(long = "out", value_name = "HH:MM", conflicts_with = "keep_out")]
    pub leave: Option<String>,

    /// Morning bus; "default" drops the override.
    #[arg(long, value_enum)]
    pub bus_morning: Option<BusChoice>,

    /// Afternoon bus; "default" drops the override.
    #[arg(long, value_enum)]
    pub bus_afternoon: Option<BusChoice>,

    /// Mark the child absent.
    #[arg(long, conflicts_with = "present")]
    pub absent: bool,

    /// Mark the child present again.
    #[arg(long)]
    pub present: bool,

    /// Replace the note.
    #[arg(long, conflicts_with = "clear_note")]
    pub note: Option<String>,

    /// Remove the note.
    #[arg(long)]
    pub clear_note: bool,

    /// Go back to the default arrival time.
    #[arg(long)]
    pub keep_in: bool,

    /// Go back to the default departure time.
    #[arg(long)]
    pub keep_out: bool,
}

#[derive(Debug, Args)]
pub struct RevertArgs {
    /// Change ID, as shown by `history`.
    pub id: String,
}

/// Records a new change, refusing a second one for the same child and date.
pub fn run<W: Write>(writer: &mut W, args: &ChangeArgs, config: &Config) -> Result<()> {
    run_at(writer, args, config, Local::now().date_naive())
}

/// Like [`run`], with relative dates counted from `today`.
pub fn run_at<W: Write>(
    writer: &mut W,
    args: &ChangeArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let child_id = parse_child_id(&args.child)?;
    let date = parse_date(&args.date, today)?;
    let created_by = staff_id(config, args.by.as_deref())?;
    let new_in = args
        .arrive
        .as_deref()
        .map(|value| parse_time("--in", value))
        .transpose()?;
    let new_out = args
        .leave
        .as_deref()
        .map(|value| parse_time("--out", value))
        .transpose()?;
    let note = clean_note(args.note.as_deref());
    let bus_morning_override = args.bus_morning.and_then(BusChoice::as_override);
    let bus_afternoon_override = args.bus_afternoon.and_then(BusChoice::as_override);

    if new_in.is_none()
        && new_out.is_none()
        && bus_morning_override.is_none()
        && bus_afternoon_override.is_none()
        && !args.absent
        && note.is_none()
    {
        bail!("nothing to change: pass --in, --out, --bus-morning, --bus-afternoon, --absent or --note");
    }

    let mut db = open_database(config)?;
    let Some(child) = db.find_child(&child_id)? else {
        bail!("child not found: {child_id}");
    };
    if !child.active {
        bail!("{} is no longer enrolled", child.name);
    }
    let existing = db
        .list_exceptions_for_date(date)?
        .into_iter()
        .find(|exception| exception.child_id == child_id);
    if let Some(existing) = existing {
        bail!(
            "{} already has a change on {date}; use `cometa edit {}` instead",
            child.name,
            existing.id
        );
    }

    db.create_exception(NewException {
        child_id: child_id.clone(),
        date,
        new_in,
        new_out,
        bus_morning_override,
        bus_afternoon_override,
        absent: args.absent,
        note,
        created_by,
    })?;

    writeln!(writer, "{}", strings(config.locale).saved)?;
    write_resolved(writer, &db, &child_id, date, config)
}

/// Applies the given flags to an existing change.
pub fn edit<W: Write>(writer: &mut W, args: &EditArgs, config: &Config) -> Result<()> {
    let id = ExceptionId::new(args.id.as_str()).context("invalid change ID")?;
    let patch = patch_from(args)?;
    if patch.is_empty() {
        bail!("nothing to change");
    }

    let mut db = open_database(config)?;
    let exception = db.update_exception(&id, &patch)?;

    writeln!(writer, "{}", strings(config.locale).saved)?;
    write_resolved(writer, &db, &exception.child_id, exception.date, config)
}

/// Deletes a change so the child's default schedule applies again.
pub fn revert<W: Write>(writer: &mut W, args: &RevertArgs, config: &Config) -> Result<()> {
    let id = ExceptionId::new(args.id.as_str()).context("invalid change ID")?;

    let mut db = open_database(config)?;
    let Some(exception) = db.find_exception(&id)? else {
        bail!("change not found: {id}");
    };
    db.delete_exception(&id)?;

    writeln!(writer, "{}", strings(config.locale).reverted)?;
    write_resolved(writer, &db, &exception.child_id, exception.date, config)
}

fn patch_from(args: &EditArgs) -> Result<ExceptionPatch> {
    let new_in = if args.keep_in {
        Some(None)
    } else {
        args.arrive
            .as_deref()
            .map(|value| parse_time("--in", value).map(Some))
            .transpose()?
    };
    let new_out = if args.keep_out {
        Some(None)
    } else {
        args.leave
            .as_deref()
            .map(|value| parse_time("--out", value).map(Some))
            .transpose()?
    };
    let absent = if args.absent {
        Some(true)
    } else if args.present {
        Some(false)
    } else {
        None
    };
    let note = if args.clear_note {
        Some(None)
    } else {
        args.note.as_deref().map(|note| clean_note(Some(note)))
    };

    Ok(ExceptionPatch {
        new_in,
        new_out,
        bus_morning_override: args.bus_morning.map(BusChoice::as_override),
        bus_afternoon_override: args.bus_afternoon.map(BusChoice::as_override),
        absent,
        note,
    })
}

/// A blank note is no note.
fn clean_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string)
}

/// Re-resolves `date` and prints the line for `child_id`.
fn write_resolved<W: Write>(
    writer: &mut W,
    db: &Database,
    child_id: &ChildId,
    date: NaiveDate,
    config: &Config,
) -> Result<()> {
    let entries = load_day_view(db, date, config.locale)
        .with_context(|| format!("failed to resolve schedules for {date}"))?;
    match entries.iter().find(|entry| &entry.record.child_id == child_id) {
        Some(entry) => {
            let width = entry.record.name.chars().count();
            writeln!(writer, "{}", format_entry(entry, width, config.locale))?;
        }
        None => tracing::debug!(%child_id, %date, "child not on the active roster"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use cometa_core::Locale;
    use insta::assert_snapshot;

    use crate::commands::test_support::{
        config, date, new_exception, seed_friday, seed_roster, time,
    };

    fn change(child: &ChildId) -> ChangeArgs {
        ChangeArgs {
            child: child.to_string(),
            date: "today".to_string(),
            arrive: None,
            leave: None,
            bus_morning: None,
            bus_afternoon: None,
            absent: false,
            note: None,
            by: None,
        }
    }

    fn edit_args(id: &ExceptionId) -> EditArgs {
        EditArgs {
            id: id.to_string(),
            arrive: None,
            leave: None,
            bus_morning: None,
            bus_afternoon: None,
            absent: false,
            present: false,
            note: None,
            clear_note: false,
            keep_in: false,
            keep_out: false,
        }
    }

    fn run_change(args: &ChangeArgs, config: &Config) -> Result<String> {
        let mut output = Vec::new();
        run_at(&mut output, args, config, date("2024-03-01"))?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn change_records_exception_and_prints_resolved_line() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cometa.db");
        let mut db = Database::open(&db_path).unwrap();
        let roster = seed_roster(&mut db);

        let mut args = change(&roster.bruno.id);
        args.leave = Some("15:00".to_string());
        let output = run_change(&args, &config(&db_path, Locale::En)).unwrap();
        assert_snapshot!(output, @r"
        Saved ✓
        * Bruno Díaz  09:00-15:00  [departure earlier]
        ");

        let stored = db.list_exceptions_for_child(&roster.bruno.id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].date, date("2024-03-01"));
        assert_eq!(stored[0].new_out, Some(time("15:00")));
        assert_eq!(stored[0].new_in, None);
        assert_eq!(stored[0].created_by.as_str(), "marta");
    }

    #[test]
    fn change_uses_by_flag_and_bus_overrides() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cometa.db");
        let mut db = Database::open(&db_path).unwrap();
        let roster = seed_roster(&mut db);

        let mut args = change(&roster.ana.id);
        args.date = "+3d".to_string();
        args.bus_morning = Some(BusChoice::No);
        args.by = Some("pablo".to_string());
        let output = run_change(&args, &config(&db_path, Locale::Es)).unwrap();
        assert_eq!(output, "Guardado ✓\n* Ana López  08:00-17:00\n");

        let stored = db.list_exceptions_for_child(&roster.ana.id).unwrap();
        assert_eq!(stored[0].date, date("2024-03-04"));
        assert_eq!(stored[0].bus_morning_override, Some(false));
        assert_eq!(stored[0].created_by.as_str(), "pablo");
    }

    #[test]
    fn change_refuses_second_change_for_same_day() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cometa.db");
        let mut db = Database::open(&db_path).unwrap();
        let roster = seed_roster(&mut db);
        let (ana_change, _) = seed_friday(&mut db, &roster);

        let mut args = change(&roster.ana.id);
        args.absent = true;
        let err = run_change(&args, &config(&db_path, Locale::En)).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "Ana López already has a change on 2024-03-01; use `cometa edit {}` instead",
                ana_change.id
            )
        );
        assert_eq!(db.list_exceptions_for_child(&roster.ana.id).unwrap().len(), 1);
    }

    #[test]
    fn change_rejects_empty_and_unknown_input() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cometa.db");
        let mut db = Database::open(&db_path).unwrap();
        let roster = seed_roster(&mut db);
        let config = config(&db_path, Locale::En);

        let mut blank = change(&roster.ana.id);
        blank.note = Some("   ".to_string());
        blank.bus_morning = Some(BusChoice::Default);
        let err = run_change(&blank, &config).unwrap_err();
        assert!(err.to_string().starts_with("nothing to change"));

        let mut bad_time = change(&roster.ana.id);
        bad_time.arrive = Some("8.30".to_string());
        let err = run_change(&bad_time, &config).unwrap_err();
        assert!(err.to_string().contains("--in"));

        let mut missing = change(&roster.ana.id);
        missing.child = "nobody".to_string();
        missing.absent = true;
        let err = run_change(&missing, &config).unwrap_err();
        assert_eq!(err.to_string(), "child not found: nobody");

        db.deactivate_child(&roster.carla.id).unwrap();
        let mut inactive = change(&roster.carla.id);
        inactive.absent = true;
        let err = run_change(&inactive, &config).unwrap_err();
        assert_eq!(err.to_string(), "Carla Núñez is no longer enrolled");
    }

    #[test]
    fn edit_can_return_fields_to_default() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cometa.db");
        let mut db = Database::open(&db_path).unwrap();
        let roster = seed_roster(&mut db);
        let (ana_change, carla_change) = seed_friday(&mut db, &roster);
        let config = config(&db_path, Locale::En);

        let mut args = edit_args(&ana_change.id);
        args.keep_in = true;
        args.bus_afternoon = Some(BusChoice::Default);
        let mut output = Vec::new();
        edit(&mut output, &args, &config).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Saved ✓
          Ana López  08:00-17:00  Bus: morning
        ");

        let mut args = edit_args(&carla_change.id);
        args.present = true;
        args.clear_note = true;
        args.arrive = Some("10:00".to_string());
        let mut output = Vec::new();
        edit(&mut output, &args, &config).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output, "Saved ✓\n* Carla Núñez  10:00-15:00  [arrival later]\n");

        let stored = db.find_exception(&carla_change.id).unwrap().unwrap();
        assert!(!stored.absent);
        assert_eq!(stored.note, None);
        assert_eq!(stored.new_in, Some(time("10:00")));
    }

    #[test]
    fn edit_rejects_missing_change_and_empty_patch() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cometa.db");
        let config = config(&db_path, Locale::En);
        let missing = ExceptionId::new("missing").unwrap();

        let mut output = Vec::new();
        let err = edit(&mut output, &edit_args(&missing), &config).unwrap_err();
        assert_eq!(err.to_string(), "nothing to change");

        let mut args = edit_args(&missing);
        args.absent = true;
        let err = edit(&mut output, &args, &config).unwrap_err();
        assert_eq!(err.to_string(), "exception not found: missing");
    }

    #[test]
    fn revert_restores_default_schedule() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cometa.db");
        let mut db = Database::open(&db_path).unwrap();
        let roster = seed_roster(&mut db);
        let (ana_change, _) = seed_friday(&mut db, &roster);
        let config = config(&db_path, Locale::En);

        let mut output = Vec::new();
        let args = RevertArgs {
            id: ana_change.id.to_string(),
        };
        revert(&mut output, &args, &config).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Default schedule restored
          Ana López  08:00-17:00  Bus: morning
        ");
        assert_eq!(db.find_exception(&ana_change.id).unwrap(), None);

        let err = revert(&mut Vec::new(), &args, &config).unwrap_err();
        assert!(err.to_string().starts_with("change not found"));
    }

    #[test]
    fn revert_of_inactive_child_prints_only_confirmation() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("cometa.db");
        let mut db = Database::open(&db_path).unwrap();
        let roster = seed_roster(&mut db);
        let bruno_change = db
            .create_exception(NewException {
                absent: true,
                ..new_exception(&roster.bruno, "2024-03-01")
            })
            .unwrap();
        db.deactivate_child(&roster.bruno.id).unwrap();

        let mut output = Vec::new();
        let args = RevertArgs {
            id: bruno_change.id.to_string(),
        };
        revert(&mut output, &args, &config(&db_path, Locale::Es)).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Horario por defecto restaurado\n"
        );
    }
}
