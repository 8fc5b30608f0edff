//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::change::{ChangeArgs, EditArgs, RevertArgs};
use crate::commands::day::DayArgs;
use crate::commands::history::HistoryArgs;
use crate::commands::roster::{ChildCommand, ClassroomCommand};
use crate::commands::week::WeekArgs;

/// Daily pickup and drop-off schedules.
///
/// Shows who arrives and leaves when, and by bus, once each child's default
/// schedule and the day's changes are combined.
#[derive(Debug, Parser)]
#[command(name = "cometa", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show every child's schedule for one day.
    Day(DayArgs),

    /// Summarize changes from Monday to Friday.
    Week(WeekArgs),

    /// Record a change to a child's schedule for one day.
    Change(ChangeArgs),

    /// Edit a recorded change.
    Edit(EditArgs),

    /// Delete a change, restoring the default schedule.
    Revert(RevertArgs),

    /// List every change recorded for a child.
    History(HistoryArgs),

    /// Manage classrooms.
    Classroom {
        #[command(subcommand)]
        action: ClassroomCommand,
    },

    /// Manage children and their default schedules.
    Child {
        #[command(subcommand)]
        action: ChildCommand,
    },
}
