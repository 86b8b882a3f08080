//! Query optimizer entry point
//!
//! Stateless per call: reads metadata, never writes. The input query is left
//! untouched and a new, annotated query is returned.

use super::ast::{BinaryCondition, Condition, JoinClause, ParsedQuery, SelectQuery};
use super::errors::OptimizerResult;
use super::join::{select_join_method, JoinMethod};
use super::plan::{generate_execution_plan, ExecutionPlan};
use super::selectivity::{and_selectivity, estimate_selectivity, or_selectivity, DEFAULT_SELECTIVITY};
use super::stats::IndexStatistics;
use crate::index::IndexResult;
use crate::observability::{Logger, ObservationScope};
use crate::schema::SchemaProvider;

/// Cost-based optimizer over schema and index metadata
pub struct QueryOptimizer<'a, S: SchemaProvider, I: IndexStatistics> {
    schema: &'a S,
    indexes: &'a I,
}

impl<'a, S: SchemaProvider, I: IndexStatistics> QueryOptimizer<'a, S, I> {
    /// Creates a new optimizer
    pub fn new(schema: &'a S, indexes: &'a I) -> Self {
        Self { schema, indexes }
    }

    /// Optimizes a parsed statement. Non-SELECT statements come back unchanged.
    pub fn optimize(&self, query: &ParsedQuery) -> OptimizerResult<ParsedQuery> {
        match query {
            ParsedQuery::Select(select) => Ok(ParsedQuery::from(self.optimize_select(select)?)),
            ParsedQuery::Other(_) => Ok(query.clone()),
        }
    }

    /// Reorders predicates, picks join methods, and attaches an execution plan.
    pub fn optimize_select(&self, query: &SelectQuery) -> OptimizerResult<SelectQuery> {
        let scope = ObservationScope::with_fields("OPTIMIZE", &[("table", &query.table)]);

        match self.build(query) {
            Ok(optimized) => {
                let cost = optimized
                    .execution_plan
                    .as_ref()
                    .map(|p| p.cost)
                    .unwrap_or_default();
                scope.complete_with_fields(&[("cost", &format!("{:.2}", cost))]);
                Ok(optimized)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn build(&self, query: &SelectQuery) -> OptimizerResult<SelectQuery> {
        let mut optimized = query.clone();

        if let Some(condition) = &query.where_clause {
            optimized.where_clause = Some(self.optimize_conditions(condition, &query.table)?);
        }

        let mut left_table = query.table.clone();
        for join in optimized.joins.iter_mut() {
            let method = self.select_join_method(&left_table, &join.table, join)?;
            join.method = Some(method);
            left_table = join.table.clone();
        }

        optimized.execution_plan = Some(self.generate_execution_plan(&optimized)?);
        Ok(optimized)
    }

    /// Annotates every node with a selectivity estimate and moves the more
    /// selective child of each AND to the left.
    pub fn optimize_conditions(&self, condition: &Condition, table: &str) -> IndexResult<Condition> {
        match condition {
            Condition::Comparison(cmp) => {
                let mut cmp = cmp.clone();
                cmp.selectivity = Some(estimate_selectivity(self.indexes, table, &cmp)?);
                Ok(Condition::Comparison(cmp))
            }
            Condition::And(node) => {
                let left = self.optimize_conditions(&node.left, table)?;
                let right = self.optimize_conditions(&node.right, table)?;
                let (ls, rs) = (selectivity_of(&left), selectivity_of(&right));

                let (left, right) = if rs < ls { (right, left) } else { (left, right) };
                Ok(Condition::And(BinaryCondition {
                    left: Box::new(left),
                    right: Box::new(right),
                    selectivity: Some(and_selectivity(ls, rs)),
                }))
            }
            Condition::Or(node) => {
                let left = self.optimize_conditions(&node.left, table)?;
                let right = self.optimize_conditions(&node.right, table)?;
                let selectivity = or_selectivity(selectivity_of(&left), selectivity_of(&right));

                Ok(Condition::Or(BinaryCondition {
                    left: Box::new(left),
                    right: Box::new(right),
                    selectivity: Some(selectivity),
                }))
            }
        }
    }

    fn select_join_method(
        &self,
        left_table: &str,
        right_table: &str,
        join: &JoinClause,
    ) -> OptimizerResult<JoinMethod> {
        let method =
            select_join_method(self.schema, self.indexes, left_table, right_table, &join.condition)?;
        Logger::trace(
            "JOIN_METHOD_SELECTED",
            &[
                ("left_table", left_table),
                ("method", method.as_str()),
                ("right_table", right_table),
            ],
        );
        Ok(method)
    }

    /// Builds the cost-annotated plan for an optimized query.
    pub fn generate_execution_plan(&self, query: &SelectQuery) -> OptimizerResult<ExecutionPlan> {
        Ok(generate_execution_plan(self.schema, query)?)
    }
}

fn selectivity_of(condition: &Condition) -> f64 {
    condition.selectivity().unwrap_or(DEFAULT_SELECTIVITY)
}
