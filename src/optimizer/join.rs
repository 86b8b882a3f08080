//! Join method selection and join cost model
//!
//! Decision order (first match wins):
//!
//! 1. Join column is the primary key on both sides → index-nested-loop
//! 2. Join column indexed on both sides → sort-merge
//! 3. Indexed on exactly one side and the size ratio exceeds 1 → index-nested-loop
//! 4. Combined size below 1000 rows → nested-loop
//! 5. Otherwise → sort-merge
//!
//! Rule 3 fires for almost any pair of unequal tables. The order is kept
//! as-is; it is not a cost-based choice.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ast::JoinCondition;
use super::errors::OptimizerResult;
use super::stats::IndexStatistics;
use crate::schema::SchemaProvider;

/// Below this combined row count a plain nested loop is chosen.
pub const NESTED_LOOP_THRESHOLD: u64 = 1000;

/// Fraction of the cross product assumed to survive a join.
pub const JOIN_SELECTIVITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinMethod {
    NestedLoop,
    SortMerge,
    IndexNestedLoop,
}

impl JoinMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinMethod::NestedLoop => "nested-loop",
            JoinMethod::SortMerge => "sort-merge",
            JoinMethod::IndexNestedLoop => "index-nested-loop",
        }
    }

    /// Estimated cost of joining `outer` rows with `inner` rows.
    pub fn cost(&self, outer: u64, inner: u64) -> f64 {
        match self {
            JoinMethod::SortMerge => sort_cost(outer) + sort_cost(inner),
            JoinMethod::NestedLoop => outer as f64 * inner as f64,
            JoinMethod::IndexNestedLoop => outer as f64,
        }
    }
}

impl fmt::Display for JoinMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `N * (log2(N) + 1)`, zero for an empty input.
pub fn sort_cost(rows: u64) -> f64 {
    if rows == 0 {
        return 0.0;
    }
    let n = rows as f64;
    n * (n.log2() + 1.0)
}

/// Estimated output rows of joining `outer` with `inner` rows.
pub fn join_output(outer: u64, inner: u64) -> u64 {
    (outer as f64 * inner as f64 * JOIN_SELECTIVITY).round() as u64
}

/// Statistics that drive the join decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinInputs {
    pub left_indexed: bool,
    pub right_indexed: bool,
    pub left_is_pk: bool,
    pub right_is_pk: bool,
    pub left_size: u64,
    pub right_size: u64,
}

impl JoinInputs {
    /// `max(size) / max(1, min(size))`
    pub fn size_ratio(&self) -> f64 {
        let larger = self.left_size.max(self.right_size) as f64;
        let smaller = self.left_size.min(self.right_size).max(1) as f64;
        larger / smaller
    }

    pub fn choose(&self) -> JoinMethod {
        if self.left_is_pk && self.right_is_pk {
            JoinMethod::IndexNestedLoop
        } else if self.left_indexed && self.right_indexed {
            JoinMethod::SortMerge
        } else if self.left_indexed != self.right_indexed && self.size_ratio() > 1.0 {
            JoinMethod::IndexNestedLoop
        } else if self.left_size.saturating_add(self.right_size) < NESTED_LOOP_THRESHOLD {
            JoinMethod::NestedLoop
        } else {
            JoinMethod::SortMerge
        }
    }
}

/// Gathers statistics for both sides of `condition` and picks a method.
pub fn select_join_method<S, I>(
    schema: &S,
    indexes: &I,
    left_table: &str,
    right_table: &str,
    condition: &JoinCondition,
) -> OptimizerResult<JoinMethod>
where
    S: SchemaProvider,
    I: IndexStatistics,
{
    let left_key = condition.left_column.as_str();
    let right_key = condition.right_column.as_str();

    let inputs = JoinInputs {
        left_indexed: indexes.index_exists(left_table, left_key),
        right_indexed: indexes.index_exists(right_table, right_key),
        left_is_pk: schema.get_primary_key(left_table)?.as_deref() == Some(left_key),
        right_is_pk: schema.get_primary_key(right_table)?.as_deref() == Some(right_key),
        left_size: schema.get_record_count(left_table)?,
        right_size: schema.get_record_count(right_table)?,
    };

    Ok(inputs.choose())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(left_size: u64, right_size: u64) -> JoinInputs {
        JoinInputs {
            left_indexed: false,
            right_indexed: false,
            left_is_pk: false,
            right_is_pk: false,
            left_size,
            right_size,
        }
    }

    #[test]
    fn test_primary_keys_on_both_sides() {
        let j = JoinInputs {
            left_is_pk: true,
            right_is_pk: true,
            left_indexed: true,
            right_indexed: true,
            ..inputs(5000, 5000)
        };
        assert_eq!(j.choose(), JoinMethod::IndexNestedLoop);
    }

    #[test]
    fn test_both_indexed_one_pk_is_sort_merge() {
        let j = JoinInputs {
            left_is_pk: true,
            left_indexed: true,
            right_indexed: true,
            ..inputs(10, 10_000)
        };
        assert_eq!(j.choose(), JoinMethod::SortMerge);
    }

    #[test]
    fn test_one_side_indexed() {
        let j = JoinInputs {
            right_indexed: true,
            ..inputs(10, 20)
        };
        assert_eq!(j.choose(), JoinMethod::IndexNestedLoop);

        // Equal sizes: ratio is exactly 1, falls through
        let j = JoinInputs {
            right_indexed: true,
            ..inputs(20, 20)
        };
        assert_eq!(j.choose(), JoinMethod::NestedLoop);

        let j = JoinInputs {
            left_indexed: true,
            ..inputs(2000, 2000)
        };
        assert_eq!(j.choose(), JoinMethod::SortMerge);
    }

    #[test]
    fn test_unindexed_by_size() {
        assert_eq!(inputs(400, 599).choose(), JoinMethod::NestedLoop);
        assert_eq!(inputs(400, 600).choose(), JoinMethod::SortMerge);
        assert_eq!(inputs(0, 0).choose(), JoinMethod::NestedLoop);
    }

    #[test]
    fn test_size_ratio_with_empty_table() {
        assert_eq!(inputs(0, 50).size_ratio(), 50.0);
        assert_eq!(inputs(0, 0).size_ratio(), 0.0);
    }

    #[test]
    fn test_costs() {
        assert_eq!(sort_cost(0), 0.0);
        assert_eq!(sort_cost(1), 1.0);
        assert_eq!(sort_cost(8), 32.0);
        assert_eq!(JoinMethod::SortMerge.cost(8, 4), 32.0 + 12.0);
        assert_eq!(JoinMethod::NestedLoop.cost(8, 4), 32.0);
        assert_eq!(JoinMethod::IndexNestedLoop.cost(8, 4), 8.0);
        assert_eq!(join_output(100, 30), 300);
        assert_eq!(join_output(0, 30), 0);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&JoinMethod::IndexNestedLoop).unwrap(),
            "\"index-nested-loop\""
        );
        let m: JoinMethod = serde_json::from_str("\"sort-merge\"").unwrap();
        assert_eq!(m, JoinMethod::SortMerge);
    }
}
