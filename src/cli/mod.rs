//! CLI module for reldb
//!
//! Provides command-line maintenance for a data directory:
//! - init: Create directory structure and an empty catalog
//! - create-table / drop-table: Manage catalog entries and table files
//! - create-index / drop-index / rebuild-index: Manage column indexes
//! - vacuum: Compact a table and rebuild its indexes
//! - explain: Optimize a parsed query read from stdin

mod args;
pub mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response, write_text};
