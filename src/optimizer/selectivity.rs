//! Selectivity estimation
//!
//! Point estimates only: a distinct-key count when an index exists, fixed
//! heuristics otherwise. No histograms, no sampling.

use super::ast::Comparison;
use super::stats::IndexStatistics;
use crate::index::{ComparisonOp, IndexResult};

/// Fallback for anything without a better estimate, including `=` without an index
pub const DEFAULT_SELECTIVITY: f64 = 0.5;

/// `<`, `<=`, `>`, `>=` without an index
pub const UNINDEXED_RANGE_SELECTIVITY: f64 = 0.1;

/// `!=` without an index
pub const UNINDEXED_NOT_EQUAL_SELECTIVITY: f64 = 0.3;

/// `<`, `<=`, `>`, `>=` on an indexed column
pub const INDEXED_RANGE_SELECTIVITY: f64 = 0.3;

/// Estimate for a column without an index.
pub fn heuristic_selectivity(op: ComparisonOp) -> f64 {
    match op {
        op if op.is_range() => UNINDEXED_RANGE_SELECTIVITY,
        ComparisonOp::NotEq => UNINDEXED_NOT_EQUAL_SELECTIVITY,
        _ => DEFAULT_SELECTIVITY,
    }
}

/// Estimate for an indexed column with `key_count` distinct keys.
///
/// Assumes keys are uniformly distributed.
pub fn indexed_selectivity(op: ComparisonOp, key_count: usize) -> f64 {
    let per_key = 1.0 / key_count.max(1) as f64;
    match op {
        ComparisonOp::Eq => per_key,
        ComparisonOp::NotEq => 1.0 - per_key,
        _ => INDEXED_RANGE_SELECTIVITY,
    }
}

/// Selectivity of `left AND right`, assuming independence.
pub fn and_selectivity(left: f64, right: f64) -> f64 {
    left * right
}

/// Selectivity of `left OR right`, by inclusion-exclusion.
pub fn or_selectivity(left: f64, right: f64) -> f64 {
    left + right - left * right
}

/// Estimates the fraction of `table`'s rows that satisfy `comparison`.
///
/// A qualified field is looked up on its own table.
pub fn estimate_selectivity<I: IndexStatistics>(
    indexes: &I,
    table: &str,
    comparison: &Comparison,
) -> IndexResult<f64> {
    let table = comparison.field.table.as_deref().unwrap_or(table);
    let column = comparison.field.name.as_str();

    if !indexes.index_exists(table, column) {
        return Ok(heuristic_selectivity(comparison.operator));
    }

    let key_count = indexes.key_count(table, column)?;
    Ok(indexed_selectivity(comparison.operator, key_count))
}
