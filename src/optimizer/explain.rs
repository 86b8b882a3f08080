//! Human-readable explain output
//!
//! Deterministic: the same plan always renders to the same text.

use std::fmt;

use super::plan::{ExecutionPlan, ProjectionKind};

/// One line of explain output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainStep {
    pub operation: &'static str,
    pub detail: String,
    pub cost: f64,
}

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Steps in execution order
    pub steps: Vec<ExplainStep>,
    pub total_cost: f64,
    /// Rows produced by the query
    pub output_records: u64,
}

impl ExplainPlan {
    /// Creates an explain plan from an execution plan
    pub fn from_plan(plan: &ExecutionPlan) -> Self {
        let mut steps = Vec::new();

        let access = &plan.table_access;
        steps.push(ExplainStep {
            operation: "Table Access",
            detail: format!(
                "{} ({}, {} records)",
                access.table,
                access.method.as_str(),
                access.records
            ),
            cost: access.cost,
        });

        if let Some(filter) = &plan.filter {
            steps.push(ExplainStep {
                operation: "Filter",
                detail: format!(
                    "{} (selectivity {:.4}, {} records)",
                    filter.condition, filter.selectivity, filter.output_records
                ),
                cost: filter.cost,
            });
        }

        for join in &plan.joins {
            steps.push(ExplainStep {
                operation: "Join",
                detail: format!(
                    "{} x {} [{}] ON {} ({} records)",
                    join.left_table, join.right_table, join.method, join.condition, join.output_records
                ),
                cost: join.cost,
            });
        }

        let projection = &plan.projection;
        let columns = match projection.kind {
            ProjectionKind::All => "*".to_string(),
            ProjectionKind::Columns => projection.columns.join(", "),
        };
        steps.push(ExplainStep {
            operation: "Projection",
            detail: columns,
            cost: projection.cost,
        });

        if let Some(sort) = &plan.sort {
            steps.push(ExplainStep {
                operation: "Sort",
                detail: sort.columns.join(", "),
                cost: sort.cost,
            });
        }

        Self {
            steps,
            total_cost: plan.cost,
            output_records: plan.output_records(),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        for step in &self.steps {
            writeln!(f, "{}: {} [cost {:.2}]", step.operation, step.detail, step.cost)?;
        }
        writeln!(f, "Output: {} records", self.output_records)?;
        writeln!(f, "Total Cost: {:.2}", self.total_cost)
    }
}
