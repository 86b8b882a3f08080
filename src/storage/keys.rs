//! Index key type
//!
//! Keys use the natural ordering of their values: integers and floats compare
//! numerically with each other, strings lexicographically. Across types the
//! order is Null < Bool < Number < String.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Index key representing a scalar column value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub enum IndexKey {
    /// Column missing or explicitly null
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
}

impl IndexKey {
    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a JSON value.
    ///
    /// Arrays and objects are not indexable and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(IndexKey::Null),
            Value::Bool(b) => Some(IndexKey::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(IndexKey::Int(i))
                } else {
                    n.as_f64().map(IndexKey::Float)
                }
            }
            Value::String(s) => Some(IndexKey::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Converts the key back into a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            IndexKey::Null => Value::Null,
            IndexKey::Bool(b) => Value::Bool(*b),
            IndexKey::Int(i) => Value::Number((*i).into()),
            IndexKey::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            IndexKey::String(s) => Value::String(s.clone()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            IndexKey::Null => 0,
            IndexKey::Bool(_) => 1,
            IndexKey::Int(_) | IndexKey::Float(_) => 2,
            IndexKey::String(_) => 3,
        }
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexKey::Null, IndexKey::Null) => Ordering::Equal,
            (IndexKey::Bool(a), IndexKey::Bool(b)) => a.cmp(b),
            (IndexKey::Int(a), IndexKey::Int(b)) => a.cmp(b),
            (IndexKey::Float(a), IndexKey::Float(b)) => cmp_floats(*a, *b),
            (IndexKey::Int(a), IndexKey::Float(b)) => cmp_int_float(*a, *b),
            (IndexKey::Float(a), IndexKey::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (IndexKey::String(a), IndexKey::String(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

/// 2^63, the first float above every `i64`
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Numeric order with `-0.0 == 0.0`. NaN sorts after every number, or before
/// when its sign bit is set.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, true) => a.total_cmp(&b),
        (true, false) => nan_position(a),
        (false, true) => nan_position(b).reverse(),
    }
}

fn nan_position(nan: f64) -> Ordering {
    if nan.is_sign_negative() {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Exact comparison of an integer against a float. No rounding through
/// `i64 as f64`, which is lossy above 2^53.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return nan_position(f).reverse();
    }
    if f >= I64_UPPER {
        return Ordering::Less;
    }
    if f < -I64_UPPER {
        return Ordering::Greater;
    }

    // In range, so the truncated float converts to i64 exactly
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => cmp_floats(whole, f),
        other => other,
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl From<IndexKey> for Value {
    fn from(key: IndexKey) -> Self {
        key.to_json()
    }
}

impl TryFrom<Value> for IndexKey {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        IndexKey::from_json(&value).ok_or_else(|| format!("value is not indexable: {}", value))
    }
}

impl From<i64> for IndexKey {
    fn from(v: i64) -> Self {
        IndexKey::Int(v)
    }
}

impl From<f64> for IndexKey {
    fn from(v: f64) -> Self {
        IndexKey::Float(v)
    }
}

impl From<bool> for IndexKey {
    fn from(v: bool) -> Self {
        IndexKey::Bool(v)
    }
}

impl From<&str> for IndexKey {
    fn from(v: &str) -> Self {
        IndexKey::String(v.to_string())
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Null => write!(f, "null"),
            IndexKey::Bool(b) => write!(f, "{}", b),
            IndexKey::Int(i) => write!(f, "{}", i),
            IndexKey::Float(v) => write!(f, "{}", v),
            IndexKey::String(s) => write!(f, "{}", s),
        }
    }
}
