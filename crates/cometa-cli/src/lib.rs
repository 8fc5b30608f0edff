//! Attendance CLI library.
//!
//! This crate provides the `cometa` command-line interface over the
//! resolution engine and the SQLite store.

mod cli;
pub mod commands;
mod config;
mod strings;

pub use cli::{Cli, Commands};
pub use config::Config;
