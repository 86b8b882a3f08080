//! Query Optimizer subsystem
//!
//! Turns a parsed SELECT into an equivalent query with reordered predicates,
//! chosen join methods, and a cost-estimated execution plan.
//!
//! # Design Principles
//!
//! - Pure with respect to storage: only metadata is read
//! - Immutable input: a new condition tree is built bottom-up
//! - Deterministic: same query and metadata → same plan
//!
//! # Usage
//!
//! ```ignore
//! let optimizer = QueryOptimizer::new(&catalog, &index_manager);
//! let optimized = optimizer.optimize(&parsed)?;
//! ```

mod ast;
mod errors;
mod explain;
mod join;
mod optimizer;
mod plan;
mod selectivity;
mod stats;

pub use ast::{
    BinaryCondition, ColumnRef, Comparison, Condition, JoinClause, JoinCondition, Operand,
    OrderBy, ParsedQuery, ProjectedColumn, Projection, SelectQuery, SelectTag, SortDirection,
};
pub use errors::{OptimizerError, OptimizerResult};
pub use explain::{ExplainPlan, ExplainStep};
pub use join::{join_output, select_join_method, sort_cost, JoinInputs, JoinMethod};
pub use optimizer::QueryOptimizer;
pub use plan::{
    generate_execution_plan, AccessMethod, ExecutionPlan, FilterNode, JoinNode, ProjectionKind,
    ProjectionNode, SortNode, TableAccessNode,
};
pub use selectivity::{
    and_selectivity, estimate_selectivity, heuristic_selectivity, indexed_selectivity,
    or_selectivity, DEFAULT_SELECTIVITY,
};
pub use stats::IndexStatistics;
