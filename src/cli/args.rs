//! CLI argument definitions using clap
//!
//! Commands:
//! - reldb init
//! - reldb create-table <table> --columns a,b,c [--primary-key a]
//! - reldb drop-table <table>
//! - reldb create-index <table> <column>
//! - reldb drop-index <table> <column>
//! - reldb rebuild-index <table> <column>
//! - reldb vacuum <table>
//! - reldb explain [--text]
//!
//! Every command accepts `--config <path>` (default `./reldb.json`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// reldb - relational storage engine maintenance tool
#[derive(Parser, Debug)]
#[command(name = "reldb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./reldb.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init,

    /// Create a table (and an index on its primary key)
    CreateTable {
        table: String,
        /// Comma-separated column names
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
        #[arg(long)]
        primary_key: Option<String>,
    },

    /// Drop a table with all of its indexes
    DropTable { table: String },

    /// Create and populate an index
    CreateIndex { table: String, column: String },

    /// Drop an index
    DropIndex { table: String, column: String },

    /// Rebuild an index from its table
    RebuildIndex { table: String, column: String },

    /// Remove deleted records and rebuild the table's indexes
    Vacuum { table: String },

    /// Optimize a parsed query read from stdin
    Explain {
        /// Print the plan as text instead of JSON
        #[arg(long)]
        text: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
