//! Command-line interface for ovh-exporter.
//!
//! Parses flags and environment variables, then wires discovery, the usage
//! collector and the scrape endpoint together.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, LogFormat};
