//! Classroom and child management.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Subcommand};
use cometa_core::{
    ChildProfile, ClassroomId, Locale, classify_localized, compare_names, resolve,
};
use cometa_db::{Classroom, NewChild};

use crate::Config;
use crate::commands::util::{open_database, parse_child_id, parse_time};
use crate::strings::strings;

#[derive(Debug, Subcommand)]
pub enum ClassroomCommand {
    /// Add a classroom.
    Add {
        /// Display name.
        name: String,
    },
    /// List classrooms.
    List,
}

#[derive(Debug, Subcommand)]
pub enum ChildCommand {
    /// Enroll a child with a default schedule.
    Add(ChildAddArgs),
    /// List children.
    List {
        /// Include children who are no longer enrolled.
        #[arg(long)]
        all: bool,
    },
    /// Mark a child as no longer enrolled.
    Deactivate {
        /// Child ID.
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct ChildAddArgs {
    /// Display name.
    pub name: String,

    /// Classroom ID.
    #[arg(long)]
    pub classroom: Option<String>,

    /// Default arrival time.
    #[arg(long = "in", value_name = "HH:MM")]
    pub arrive: String,

    /// Default departure time.
    #[arg(long = "out", value_name = "HH:MM")]
    pub leave: String,

    /// Takes the morning bus by default.
    #[arg(long)]
    pub bus_morning: bool,

    /// Takes the afternoon bus by default.
    #[arg(long)]
    pub bus_afternoon: bool,
}

pub fn classroom<W: Write>(
    writer: &mut W,
    command: &ClassroomCommand,
    config: &Config,
) -> Result<()> {
    let mut db = open_database(config)?;
    match command {
        ClassroomCommand::Add { name } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("classroom name cannot be empty");
            }
            let classroom = db.add_classroom(name)?;
            writeln!(writer, "{}  {}", classroom.id, classroom.name)?;
        }
        ClassroomCommand::List => {
            let mut classrooms = db.list_classrooms()?;
            if classrooms.is_empty() {
                writeln!(writer, "{}", strings(config.locale).no_classrooms)?;
                return Ok(());
            }
            classrooms.sort_by(|a, b| compare_names(&a.name, &b.name));
            for classroom in &classrooms {
                writeln!(writer, "{}  {}", classroom.id, classroom.name)?;
            }
        }
    }
    Ok(())
}

pub fn child<W: Write>(writer: &mut W, command: &ChildCommand, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    match command {
        ChildCommand::Add(args) => {
            let name = args.name.trim();
            if name.is_empty() {
                bail!("child name cannot be empty");
            }
            let classroom_id = args
                .classroom
                .as_deref()
                .map(ClassroomId::new)
                .transpose()
                .context("invalid classroom ID")?;
            let child = db.add_child(NewChild {
                name: name.to_string(),
                classroom_id,
                default_in: parse_time("--in", &args.arrive)?,
                default_out: parse_time("--out", &args.leave)?,
                bus_morning: args.bus_morning,
                bus_afternoon: args.bus_afternoon,
            })?;
            let classrooms = db.list_classrooms()?;
            let rooms = classroom_names(&classrooms);
            writeln!(writer, "{}", format_child(&child, &rooms, 0, config.locale)?)?;
        }
        ChildCommand::List { all } => {
            let mut children = db.list_children(*all)?;
            if children.is_empty() {
                writeln!(writer, "{}", strings(config.locale).no_children)?;
                return Ok(());
            }
            children.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
            let classrooms = db.list_classrooms()?;
            let rooms = classroom_names(&classrooms);
            let width = children
                .iter()
                .map(|child| child.name.chars().count())
                .max()
                .unwrap_or(0);
            for child in &children {
                writeln!(writer, "{}", format_child(child, &rooms, width, config.locale)?)?;
            }
        }
        ChildCommand::Deactivate { id } => {
            let id = parse_child_id(id)?;
            let Some(child) = db.find_child(&id)? else {
                bail!("child not found: {id}");
            };
            db.deactivate_child(&id)?;
            writeln!(writer, "{}  {} ({})", child.id, child.name, strings(config.locale).inactive)?;
        }
    }
    Ok(())
}

fn classroom_names(classrooms: &[Classroom]) -> HashMap<&ClassroomId, &str> {
    classrooms
        .iter()
        .map(|classroom| (&classroom.id, classroom.name.as_str()))
        .collect()
}

/// "<id>  Ana López  08:00-17:00  Bus: morning  Classroom: Girasoles"
fn format_child(
    child: &ChildProfile,
    rooms: &HashMap<&ClassroomId, &str>,
    width: usize,
    locale: Locale,
) -> Result<String> {
    let strings = strings(locale);
    // The bus label of a plain day is the default bus label.
    let record = resolve(child, None, Local::now().date_naive())?;
    let classification = classify_localized(&record, child, locale)?;

    let mut line = String::new();
    write!(
        line,
        "{}  {:<width$}  {}-{}",
        child.id, child.name, child.default_in, child.default_out
    )
    .unwrap();
    if !classification.bus_label.is_empty() {
        write!(line, "  {}: {}", strings.bus, classification.bus_label).unwrap();
    }
    if let Some(classroom_id) = &child.classroom_id {
        let room = rooms
            .get(classroom_id)
            .copied()
            .unwrap_or_else(|| classroom_id.as_str());
        write!(line, "  {}: {room}", strings.classroom).unwrap();
    }
    if !child.active {
        write!(line, "  ({})", strings.inactive).unwrap();
    }
    Ok(line)
}
