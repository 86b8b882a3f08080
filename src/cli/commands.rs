//! CLI command implementations
//!
//! Each command loads the configuration, opens the engine, performs one
//! operation, and returns a JSON summary. `run_command` writes that summary
//! (or the error) to stdout; log events go to stderr so stdout stays one
//! JSON document.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::index::IndexManager;
use crate::observability::Logger;
use crate::optimizer::{ExplainPlan, ParsedQuery, QueryOptimizer};
use crate::schema::{Catalog, TableDef};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{parse_request, read_request, write_error, write_response, write_text};

/// Opened engine handles
struct Engine {
    catalog: Catalog,
    indexes: IndexManager,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(&cli.config, cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(config_path: &Path, cmd: Command) -> CliResult<()> {
    Logger::set_stderr_only(true);

    let result = match cmd {
        Command::Init => init(config_path),
        Command::CreateTable {
            table,
            columns,
            primary_key,
        } => create_table(config_path, &table, columns, primary_key),
        Command::DropTable { table } => drop_table(config_path, &table),
        Command::CreateIndex { table, column } => create_index(config_path, &table, &column),
        Command::DropIndex { table, column } => drop_index(config_path, &table, &column),
        Command::RebuildIndex { table, column } => rebuild_index(config_path, &table, &column),
        Command::Vacuum { table } => vacuum(config_path, &table),
        Command::Explain { text: false } => {
            read_request().and_then(|request| explain(config_path, &request))
        }
        Command::Explain { text: true } => {
            let rendered = read_request().and_then(|request| explain_text(config_path, &request));
            return report(rendered.and_then(|text| write_text(&text)));
        }
    };

    report(result.and_then(write_response))
}

/// Writes the error response for a failed command and passes the error on
fn report(result: CliResult<()>) -> CliResult<()> {
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Initialize a new data directory
///
/// Creates `data/`, `indexes/`, and an empty `metadata/catalog.json`.
pub fn init(config_path: &Path) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let data_dir = config.data_dir.as_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    let storage = config.open_storage()?;
    let catalog = Catalog::open(storage)?;
    catalog.save()?;

    Ok(json!({"initialized": true}))
}

/// Creates a table and, if it has one, an index on its primary key
pub fn create_table(
    config_path: &Path,
    table: &str,
    columns: Vec<String>,
    primary_key: Option<String>,
) -> CliResult<Value> {
    let mut engine = open_engine(config_path)?;

    engine
        .catalog
        .create_table(table, columns.clone(), primary_key.clone())?;
    if let Some(pk) = &primary_key {
        engine.indexes.create_index(table, pk)?;
    }

    Ok(json!({
        "table": table,
        "columns": columns,
        "primary_key": primary_key,
    }))
}

pub fn drop_table(config_path: &Path, table: &str) -> CliResult<Value> {
    let mut engine = open_engine(config_path)?;
    engine.catalog.drop_table(table)?;
    Ok(json!({"dropped": table}))
}

pub fn create_index(config_path: &Path, table: &str, column: &str) -> CliResult<Value> {
    let engine = open_engine(config_path)?;
    require_column(&engine.catalog, table, column)?;

    engine.indexes.create_index(table, column)?;
    let keys = engine.indexes.get_key_count(table, column)?;

    Ok(json!({"table": table, "column": column, "keys": keys}))
}

/// Drops a secondary index. Primary key indexes cannot be dropped.
pub fn drop_index(config_path: &Path, table: &str, column: &str) -> CliResult<Value> {
    let engine = open_engine(config_path)?;
    let def = require_column(&engine.catalog, table, column)?;

    if def.primary_key.as_deref() == Some(column) {
        return Err(CliError::invalid_argument(format!(
            "Cannot drop index for primary key column '{}'",
            column
        )));
    }
    if !engine.indexes.index_exists(table, column) {
        return Err(CliError::invalid_argument(format!(
            "No index on '{}.{}'",
            table, column
        )));
    }

    engine.indexes.drop_index(table, column)?;
    Ok(json!({"table": table, "column": column, "dropped": true}))
}

pub fn rebuild_index(config_path: &Path, table: &str, column: &str) -> CliResult<Value> {
    let engine = open_engine(config_path)?;
    require_table(&engine.catalog, table)?;

    engine.indexes.rebuild_index(table, column)?;
    let keys = engine.indexes.get_key_count(table, column)?;

    Ok(json!({"table": table, "column": column, "keys": keys}))
}

/// Compacts a table, then rebuilds every index on it
pub fn vacuum(config_path: &Path, table: &str) -> CliResult<Value> {
    let engine = open_engine(config_path)?;
    require_table(&engine.catalog, table)?;

    let removed = engine.indexes.storage().vacuum_table(table)?;
    let rebuilt = engine.indexes.rebuild_all(table)?;

    Ok(json!({"table": table, "removed": removed, "rebuilt_indexes": rebuilt}))
}

/// Optimizes a parsed query and returns the optimized query
pub fn explain(config_path: &Path, request: &Value) -> CliResult<Value> {
    let optimized = optimize_request(config_path, request)?;
    Ok(serde_json::to_value(optimized)?)
}

/// Optimizes a parsed query and renders its execution plan as text
pub fn explain_text(config_path: &Path, request: &Value) -> CliResult<String> {
    let optimized = optimize_request(config_path, request)?;
    let plan = optimized
        .as_select()
        .and_then(|q| q.execution_plan.as_ref())
        .ok_or_else(|| CliError::invalid_argument("Only SELECT statements have a plan"))?;
    Ok(ExplainPlan::from_plan(plan).to_string())
}

fn optimize_request(config_path: &Path, request: &Value) -> CliResult<ParsedQuery> {
    let engine = open_engine(config_path)?;
    let query: ParsedQuery = serde_json::from_value(request.clone())?;

    let optimizer = QueryOptimizer::new(&engine.catalog, &engine.indexes);
    Ok(optimizer.optimize(&query)?)
}

/// Parses a request body and optimizes it; used by tests and scripting
pub fn explain_str(config_path: &Path, input: &str) -> CliResult<Value> {
    explain(config_path, &parse_request(input)?)
}

fn load_config(config_path: &Path) -> CliResult<EngineConfig> {
    let config = EngineConfig::load(config_path)?;
    config.apply_logging()?;
    Ok(config)
}

fn open_engine(config_path: &Path) -> CliResult<Engine> {
    let config = load_config(config_path)?;
    if !is_initialized(&config.data_dir) {
        return Err(CliError::not_initialized());
    }

    let storage = config.open_storage()?;
    let catalog = Catalog::open(storage.clone())?;
    let indexes = IndexManager::new(storage);
    Ok(Engine { catalog, indexes })
}

fn require_table<'c>(
    catalog: &'c Catalog,
    table: &str,
) -> CliResult<&'c TableDef> {
    catalog
        .table(table)
        .ok_or_else(|| CliError::invalid_argument(format!("Unknown table '{}'", table)))
}

fn require_column<'c>(
    catalog: &'c Catalog,
    table: &str,
    column: &str,
) -> CliResult<&'c TableDef> {
    let def = require_table(catalog, table)?;
    if !def.columns.iter().any(|c| c == column) {
        return Err(CliError::invalid_argument(format!(
            "Unknown column '{}' in table '{}'",
            column, table
        )));
    }
    Ok(def)
}

/// Check if a data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    data_dir.join("data").exists()
        && data_dir.join("indexes").exists()
        && data_dir.join("metadata").join("catalog.json").exists()
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use crate::observability::Severity;
    use super::*;
    use crate::storage::{IndexKey, Record};
    use std::fs;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("reldb.json");
        let data_dir = temp_dir.path().join("data");

        let config = json!({
            "data_dir": data_dir.to_string_lossy(),
            "sync_writes": false,
            "log_level": "ERROR"
        });

        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn setup() -> (TempDir, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        init(&config_path).unwrap();
        create_table(
            &config_path,
            "orders",
            cols(&["id", "status"]),
            Some("id".into()),
        )
        .unwrap();
        (temp_dir, config_path)
    }

    fn insert_orders(config_path: &Path, statuses: &[&str]) {
        let engine = open_engine(config_path).unwrap();
        let storage = engine.indexes.storage();
        for (i, status) in statuses.iter().enumerate() {
            let id = storage
                .insert_record(
                    "orders",
                    Record::from_json(json!({"id": i, "status": status})).unwrap(),
                )
                .unwrap();
            engine
                .indexes
                .update_index("orders", "id", &IndexKey::Int(i as i64), id, None)
                .unwrap();
        }
    }

    #[test]
    fn test_init_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        let data_dir = temp_dir.path().join("data");

        init(&config_path).unwrap();

        assert!(data_dir.join("data").exists());
        assert!(data_dir.join("indexes").exists());
        assert!(data_dir.join("metadata").join("catalog.json").exists());
    }

    #[test]
    fn test_run_command_keeps_logs_off_stdout() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        run_command(&config_path, Command::Init).unwrap();

        assert!(Logger::writes_to_stderr(Severity::Info));
        assert!(Logger::writes_to_stderr(Severity::Trace));
    }

    #[test]
    fn test_init_refuses_reinit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();

        let result = init(&config_path);
        assert_eq!(
            result.unwrap_err().code(),
            &CliErrorCode::AlreadyInitialized
        );
    }

    #[test]
    fn test_commands_require_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let result = vacuum(&config_path, "orders");
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::NotInitialized);
    }

    #[test]
    fn test_create_table_indexes_primary_key() {
        let (_dir, config_path) = setup();
        let engine = open_engine(&config_path).unwrap();
        assert!(engine.indexes.index_exists("orders", "id"));
        assert!(engine.catalog.table_exists("orders"));
    }

    #[test]
    fn test_create_index_rejects_unknown_column() {
        let (_dir, config_path) = setup();
        let err = create_index(&config_path, "orders", "missing").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidArgument);
    }

    #[test]
    fn test_drop_index_protects_primary_key() {
        let (_dir, config_path) = setup();
        let err = drop_index(&config_path, "orders", "id").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidArgument);

        create_index(&config_path, "orders", "status").unwrap();
        drop_index(&config_path, "orders", "status").unwrap();
        let err = drop_index(&config_path, "orders", "status").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidArgument);
    }

    #[test]
    fn test_vacuum_rebuilds_indexes() {
        let (_dir, config_path) = setup();
        insert_orders(&config_path, &["new", "shipped", "shipped"]);
        create_index(&config_path, "orders", "status").unwrap();

        {
            let engine = open_engine(&config_path).unwrap();
            engine.indexes.storage().delete_record("orders", 0).unwrap();
        }

        let summary = vacuum(&config_path, "orders").unwrap();
        assert_eq!(summary["removed"], 1);
        assert_eq!(summary["rebuilt_indexes"], json!(["id", "status"]));

        let engine = open_engine(&config_path).unwrap();
        assert_eq!(engine.indexes.get_key_count("orders", "status").unwrap(), 1);
    }

    #[test]
    fn test_explain_attaches_plan() {
        let (_dir, config_path) = setup();
        insert_orders(&config_path, &["new", "shipped", "shipped", "new"]);

        let input = r#"{
            "type": "SELECT",
            "table": "orders",
            "projection": {"type": "all"},
            "where": {
                "type": "comparison",
                "left": {"type": "column", "name": "status"},
                "operator": "=",
                "right": {"type": "string", "value": "shipped"}
            }
        }"#;
        let optimized = explain_str(&config_path, input).unwrap();

        assert_eq!(optimized["where"]["selectivity"], 0.5);
        let plan = &optimized["execution_plan"];
        assert_eq!(plan["table_access"]["records"], 4);
        assert_eq!(plan["filter"]["output_records"], 2);
        assert_eq!(plan["filter"]["condition"], "status = shipped");
    }

    #[test]
    fn test_explain_text_requires_select() {
        let (_dir, config_path) = setup();
        let err = explain_text(&config_path, &json!({"type": "DROP_TABLE"})).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidArgument);

        let text = explain_text(
            &config_path,
            &json!({"type": "SELECT", "table": "orders", "projection": {"type": "all"}}),
        )
        .unwrap();
        assert!(text.contains("Table Access: orders"));
    }
}
