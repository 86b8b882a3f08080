//! Execution plan and cost model
//!
//! Costs are abstract relative units. Each node carries its own cost and the
//! plan carries the sum.
//!
//! | node           | cost                          |
//! |----------------|-------------------------------|
//! | `table_access` | rows scanned                  |
//! | `filter`       | `0.1 * input`                 |
//! | `join`         | per [`JoinMethod::cost`]      |
//! | `projection`   | `0.05 * output`               |
//! | `sort`         | `N * (log2(N) + 1)`           |

use serde::{Deserialize, Serialize};

use super::ast::{Projection, SelectQuery};
use super::join::{join_output, sort_cost, JoinMethod};
use crate::schema::{SchemaProvider, SchemaResult};

/// Cost per input row of evaluating a filter
pub const FILTER_COST_PER_ROW: f64 = 0.1;

/// Cost per output row of projecting columns
pub const PROJECTION_COST_PER_ROW: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMethod {
    FullScan,
}

impl AccessMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMethod::FullScan => "full-scan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAccessNode {
    pub table: String,
    pub method: AccessMethod,
    pub records: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterNode {
    pub condition: String,
    pub selectivity: f64,
    pub output_records: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinNode {
    pub left_table: String,
    pub right_table: String,
    pub method: JoinMethod,
    pub condition: String,
    pub left_records: u64,
    pub right_records: u64,
    pub output_records: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    All,
    Columns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionNode {
    #[serde(rename = "type")]
    pub kind: ProjectionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    pub input_records: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortNode {
    pub columns: Vec<String>,
    pub input_records: u64,
    pub cost: f64,
}

/// Cost-annotated plan attached to an optimized SELECT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Sum of all node costs
    pub cost: f64,
    pub table_access: TableAccessNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterNode>,
    #[serde(rename = "join", default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinNode>,
    pub projection: ProjectionNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortNode>,
}

impl ExecutionPlan {
    /// Rows flowing out of the last row-producing node
    pub fn output_records(&self) -> u64 {
        self.projection.input_records
    }
}

/// Builds the plan for an already-optimized query.
///
/// The WHERE clause must carry its selectivity and every join its method;
/// missing values fall back to 0.5 and nested-loop.
pub fn generate_execution_plan<S: SchemaProvider>(
    schema: &S,
    query: &SelectQuery,
) -> SchemaResult<ExecutionPlan> {
    let records = schema.get_record_count(&query.table)?;
    let table_access = TableAccessNode {
        table: query.table.clone(),
        method: AccessMethod::FullScan,
        records,
        cost: records as f64,
    };
    let mut total = table_access.cost;
    let mut rows = records;

    let filter = query.where_clause.as_ref().map(|condition| {
        let selectivity = condition
            .selectivity()
            .unwrap_or(super::selectivity::DEFAULT_SELECTIVITY);
        let output_records = (selectivity * rows as f64).round() as u64;
        let node = FilterNode {
            condition: condition.to_string(),
            selectivity,
            output_records,
            cost: rows as f64 * FILTER_COST_PER_ROW,
        };
        rows = output_records;
        node
    });
    if let Some(node) = &filter {
        total += node.cost;
    }

    let mut joins = Vec::with_capacity(query.joins.len());
    let mut left_table = query.table.as_str();
    for join in &query.joins {
        let method = join.method.unwrap_or(JoinMethod::NestedLoop);
        let right_records = schema.get_record_count(&join.table)?;
        let node = JoinNode {
            left_table: left_table.to_string(),
            right_table: join.table.clone(),
            method,
            condition: join.condition.to_string(),
            left_records: rows,
            right_records,
            output_records: join_output(rows, right_records),
            cost: method.cost(rows, right_records),
        };
        total += node.cost;
        rows = node.output_records;
        left_table = join.table.as_str();
        joins.push(node);
    }

    let (kind, columns) = match &query.projection {
        Projection::All => (ProjectionKind::All, Vec::new()),
        Projection::Columns { columns } => (
            ProjectionKind::Columns,
            columns.iter().map(|c| c.label()).collect(),
        ),
    };
    let projection = ProjectionNode {
        kind,
        columns,
        input_records: rows,
        cost: rows as f64 * PROJECTION_COST_PER_ROW,
    };
    total += projection.cost;

    let sort = (!query.order_by.is_empty()).then(|| SortNode {
        columns: query.order_by.iter().map(|o| o.column.clone()).collect(),
        input_records: rows,
        cost: sort_cost(rows),
    });
    if let Some(node) = &sort {
        total += node.cost;
    }

    Ok(ExecutionPlan {
        cost: total,
        table_access,
        filter,
        joins,
        projection,
        sort,
    })
}
