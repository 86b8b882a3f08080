//! Parsed query structures consumed and produced by the optimizer
//!
//! The JSON shapes follow what the SQL front end emits:
//!
//! ```json
//! {
//!   "type": "SELECT",
//!   "table": "orders",
//!   "projection": {"type": "all"},
//!   "where": {
//!     "type": "comparison",
//!     "field": {"name": "status"},
//!     "operator": "=",
//!     "value": {"type": "literal", "value": "shipped"}
//!   },
//!   "join": [{
//!     "table": "customers",
//!     "condition": {
//!       "left_table": "orders", "left_column": "customer_id",
//!       "right_table": "customers", "right_column": "id"
//!     }
//!   }],
//!   "order_by": [{"column": "created_at", "direction": "DESC"}]
//! }
//! ```
//!
//! Comparisons also accept the front end's `left` / `right` spelling and its
//! `string` / `integer` literal tags.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::join::JoinMethod;
use super::plan::ExecutionPlan;
use crate::index::ComparisonOp;

/// Column reference, optionally qualified by table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operand {
    /// Constant value
    #[serde(alias = "string", alias = "integer")]
    Literal { value: Value },
    /// Another column
    Column {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        name: String,
    },
}

impl Operand {
    pub fn literal(value: impl Into<Value>) -> Self {
        Operand::Literal {
            value: value.into(),
        }
    }

    pub fn column(column: ColumnRef) -> Self {
        Operand::Column {
            table: column.table,
            name: column.name,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Strings render bare, everything else as JSON
            Operand::Literal {
                value: Value::String(s),
            } => write!(f, "{}", s),
            Operand::Literal { value } => write!(f, "{}", value),
            Operand::Column {
                table: Some(table),
                name,
            } => write!(f, "{}.{}", table, name),
            Operand::Column { table: None, name } => write!(f, "{}", name),
        }
    }
}

/// `field <operator> value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(alias = "left")]
    pub field: ColumnRef,
    pub operator: ComparisonOp,
    #[serde(alias = "right")]
    pub value: Operand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectivity: Option<f64>,
}

/// Children of an `and` / `or` node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryCondition {
    pub left: Box<Condition>,
    pub right: Box<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectivity: Option<f64>,
}

/// WHERE clause tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Condition {
    Comparison(Comparison),
    And(BinaryCondition),
    Or(BinaryCondition),
}

impl Condition {
    pub fn comparison(field: ColumnRef, operator: ComparisonOp, value: Operand) -> Self {
        Condition::Comparison(Comparison {
            field,
            operator,
            value,
            selectivity: None,
        })
    }

    pub fn and(left: Condition, right: Condition) -> Self {
        Condition::And(BinaryCondition {
            left: Box::new(left),
            right: Box::new(right),
            selectivity: None,
        })
    }

    pub fn or(left: Condition, right: Condition) -> Self {
        Condition::Or(BinaryCondition {
            left: Box::new(left),
            right: Box::new(right),
            selectivity: None,
        })
    }

    /// Estimated selectivity, if the node has been optimized
    pub fn selectivity(&self) -> Option<f64> {
        match self {
            Condition::Comparison(c) => c.selectivity,
            Condition::And(b) | Condition::Or(b) => b.selectivity,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison(c) => write!(f, "{} {} {}", c.field, c.operator, c.value),
            Condition::And(b) => write!(f, "({}) AND ({})", b.left, b.right),
            Condition::Or(b) => write!(f, "({}) OR ({})", b.left, b.right),
        }
    }
}

/// One projected output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProjectedColumn {
    Column {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        name: String,
    },
    #[serde(alias = "aggregation")]
    Function { function: String, argument: String },
}

impl ProjectedColumn {
    /// Label used in execution plans: the column name or `function(argument)`
    pub fn label(&self) -> String {
        match self {
            ProjectedColumn::Column { name, .. } => name.clone(),
            ProjectedColumn::Function { function, argument } => {
                format!("{}({})", function, argument)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Projection {
    /// `SELECT *`
    All,
    Columns { columns: Vec<ProjectedColumn> },
}

/// Equi-join condition `left_table.left_column = right_table.right_column`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCondition {
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} = {}.{}",
            self.left_table, self.left_column, self.right_table, self.right_column
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    pub table: String,
    pub condition: JoinCondition,
    /// Filled in by the optimizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<JoinMethod>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Tag for [`SelectQuery`]; serializes as `"SELECT"`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectTag {
    #[default]
    #[serde(rename = "SELECT")]
    Select,
}

/// A parsed SELECT statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    #[serde(rename = "type")]
    pub tag: SelectTag,
    pub table: String,
    pub projection: Projection,
    #[serde(
        rename = "where",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub where_clause: Option<Condition>,
    #[serde(
        rename = "join",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub joins: Vec<JoinClause>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub order_by: Vec<OrderBy>,
    /// Attached by the optimizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_plan: Option<ExecutionPlan>,
    /// Clauses the optimizer does not interpret (e.g. `having`), kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SelectQuery {
    /// `SELECT * FROM table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            tag: SelectTag::Select,
            table: table.into(),
            projection: Projection::All,
            where_clause: None,
            joins: Vec::new(),
            order_by: Vec::new(),
            execution_plan: None,
            extra: Map::new(),
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_where(mut self, condition: Condition) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn with_join(mut self, table: impl Into<String>, condition: JoinCondition) -> Self {
        self.joins.push(JoinClause {
            table: table.into(),
            condition,
            method: None,
        });
        self
    }

    pub fn with_order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }
}

/// Any parsed statement. Only SELECT is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedQuery {
    Select(Box<SelectQuery>),
    /// Any non-SELECT statement, carried through untouched
    Other(Value),
}

impl ParsedQuery {
    pub fn as_select(&self) -> Option<&SelectQuery> {
        match self {
            ParsedQuery::Select(q) => Some(q),
            ParsedQuery::Other(_) => None,
        }
    }
}

impl From<SelectQuery> for ParsedQuery {
    fn from(query: SelectQuery) -> Self {
        ParsedQuery::Select(Box::new(query))
    }
}

impl<'de> Deserialize<'de> for ParsedQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.get("type").and_then(Value::as_str) == Some("SELECT") {
            serde_json::from_value(value)
                .map(|q| ParsedQuery::Select(Box::new(q)))
                .map_err(de::Error::custom)
        } else {
            Ok(ParsedQuery::Other(value))
        }
    }
}

/// A single join object, a list of them, or null.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<JoinClause>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<JoinClause>),
        One(JoinClause),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(v)) => v,
        Some(OneOrMany::One(j)) => vec![j],
        None => Vec::new(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
