use std::fmt;
use std::str::FromStr;

use bson::Bson;

use crate::error::ParseError;

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `in`: field value is one of the listed values
    In,
    /// `not-in`: field value is none of the listed values
    NotIn,
    /// `array-contains`: array field holds the value
    ArrayContains,
    /// `array-contains-any`: array field holds at least one listed value
    ArrayContainsAny,
}

impl FilterOp {
    pub const ALL: [FilterOp; 10] = [
        FilterOp::Eq,
        FilterOp::Ne,
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::In,
        FilterOp::NotIn,
        FilterOp::ArrayContains,
        FilterOp::ArrayContainsAny,
    ];

    /// Operator token as written in filter expressions.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::In => "in",
            FilterOp::NotIn => "not-in",
            FilterOp::ArrayContains => "array-contains",
            FilterOp::ArrayContainsAny => "array-contains-any",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOp::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ParseError::UnknownOperator(s.to_string()))
    }
}

/// A single field comparison. Filters in a list combine with AND.
///
/// The value is forwarded to the store as is; no coercion or validation
/// happens here.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Bson,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Bson>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::Lte, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    pub fn is_in(field: impl Into<String>, values: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::In, values)
    }

    pub fn not_in(field: impl Into<String>, values: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::NotIn, values)
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::ArrayContains, value)
    }

    pub fn array_contains_any(field: impl Into<String>, values: impl Into<Bson>) -> Self {
        Self::new(field, FilterOp::ArrayContainsAny, values)
    }

    /// Parse a `FIELD OP VALUE` expression.
    ///
    /// `VALUE` is everything after the operator. It is read as JSON when
    /// possible (`42`, `true`, `["a","b"]`, `"quoted"`) and as a plain string
    /// otherwise.
    pub fn parse(expr: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidFilter(expr.to_string());

        let trimmed = expr.trim();
        let (field, rest) = trimmed.split_once(char::is_whitespace).ok_or_else(invalid)?;
        let rest = rest.trim_start();
        let (op, value) = rest.split_once(char::is_whitespace).ok_or_else(invalid)?;
        let value = value.trim();
        if field.is_empty() || value.is_empty() {
            return Err(invalid());
        }

        let op = op.parse::<FilterOp>()?;
        let value = parse_value(value)?;
        Ok(Self::new(field, op, value))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

impl FromStr for Filter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::parse(s)
    }
}

fn parse_value(raw: &str) -> Result<Bson, ParseError> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Bson::try_from(json).map_err(|e| ParseError::InvalidValue(e.to_string())),
        Err(_) => Ok(Bson::String(raw.to_string())),
    }
}
