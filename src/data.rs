use std::fmt;

use serde::{Deserialize, Serialize};

/// Field contents treated as missing values.
pub const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A", "<NA>",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
}

/// Filter-widget classification derived from a [`ColumnType`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Categorical,
    Numeric,
}

impl ColumnType {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnType::String => ColumnKind::Categorical,
            ColumnType::Integer | ColumnType::Float => ColumnKind::Numeric,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnKind::Categorical => "categorical",
            ColumnKind::Numeric => "numeric",
        })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::String(_) => None,
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw)
}

/// Converts a raw field into a typed cell. `ty` is expected to come from
/// [`infer_column_type`] over the same column; a field that does not parse as
/// `ty` is kept as text.
pub fn parse_cell(raw: &str, ty: ColumnType) -> Option<Value> {
    if is_null_token(raw) {
        return None;
    }
    let parsed = match ty {
        ColumnType::String => Value::String(raw.to_string()),
        ColumnType::Integer => match raw.trim().parse::<i64>() {
            Ok(value) => Value::Integer(value),
            Err(_) => Value::String(raw.to_string()),
        },
        ColumnType::Float => match raw.trim().parse::<f64>() {
            Ok(value) => Value::Float(value),
            Err(_) => Value::String(raw.to_string()),
        },
    };
    Some(parsed)
}

#[derive(Debug, Clone)]
pub(crate) struct TypeCandidate {
    possible_integer: bool,
    possible_float: bool,
    observed: bool,
}

impl TypeCandidate {
    pub(crate) fn new() -> Self {
        Self {
            possible_integer: true,
            possible_float: true,
            observed: false,
        }
    }

    pub(crate) fn observe(&mut self, raw: &str) {
        if is_null_token(raw) {
            return;
        }
        self.observed = true;
        let trimmed = raw.trim();
        if self.possible_integer && trimmed.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && trimmed.parse::<f64>().is_err() {
            self.possible_float = false;
        }
    }

    pub(crate) fn decide(&self) -> ColumnType {
        if !self.observed {
            ColumnType::String
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float {
            ColumnType::Float
        } else {
            ColumnType::String
        }
    }
}

pub fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidate = TypeCandidate::new();
    for value in values {
        candidate.observe(value);
    }
    candidate.decide()
}
