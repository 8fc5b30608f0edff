//! CLI subcommand implementations.

pub mod change;
pub mod day;
pub mod history;
pub mod roster;
pub mod util;
pub mod week;

#[cfg(test)]
mod test_support;
