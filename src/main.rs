//! reldb CLI entry point
//!
//! Parses arguments, dispatches to a command, and exits non-zero on
//! failure. All logic lives in the CLI module.

use reldb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
