//! CLI commands

pub mod browse;
pub mod clean;
pub mod generate;
pub mod list;
