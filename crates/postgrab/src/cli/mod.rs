//! CLI subcommand implementations for the postgrab binary.

pub mod doctor;
pub mod download_cmd;
pub mod harvest_cmd;
pub mod output;
pub mod prompt;
pub mod run_cmd;
