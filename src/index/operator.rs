//! Comparison operators shared by index lookups and query conditions

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Binary comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=", alias = "<>")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl ComparisonOp {
    /// Returns the SQL spelling of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }

    /// Returns true for `<`, `<=`, `>`, `>=`
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            ComparisonOp::Lt | ComparisonOp::Le | ComparisonOp::Gt | ComparisonOp::Ge
        )
    }

    /// Evaluates `lhs <op> rhs` given `lhs.cmp(rhs)`.
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Eq => ordering == Ordering::Equal,
            ComparisonOp::NotEq => ordering != Ordering::Equal,
            ComparisonOp::Lt => ordering == Ordering::Less,
            ComparisonOp::Le => ordering != Ordering::Greater,
            ComparisonOp::Gt => ordering == Ordering::Greater,
            ComparisonOp::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComparisonOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(ComparisonOp::Eq),
            "!=" | "<>" => Ok(ComparisonOp::NotEq),
            "<" => Ok(ComparisonOp::Lt),
            "<=" => Ok(ComparisonOp::Le),
            ">" => Ok(ComparisonOp::Gt),
            ">=" => Ok(ComparisonOp::Ge),
            other => Err(format!("unknown comparison operator '{}'", other)),
        }
    }
}
