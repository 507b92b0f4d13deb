//! Condition operators.
//!
//! Operator names are validated once when rules are loaded; evaluation
//! dispatches on the enum, never on strings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use super::RuleLoadError;

/// Closed set of supported operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Scalar equality.
    Equal,
    /// Scalar inequality.
    NotEqual,
    /// Numeric `<`.
    LessThan,
    /// Numeric `<=`.
    LessThanInclusive,
    /// Numeric `>`.
    GreaterThan,
    /// Numeric `>=`.
    GreaterThanInclusive,
    /// Fact is an element of the value array.
    In,
    /// Fact is not an element of the value array.
    NotIn,
    /// Fact array contains the value.
    Contains,
    /// Fact array does not contain the value.
    DoesNotContain,
    /// Fact is a one-element array equal to the value, or a scalar equal to it.
    ArrayEqual,
    /// Negation of [`Operator::ArrayEqual`].
    ArrayNotEqual,
    /// Boolean coercion of the fact equals the value.
    Truthy,
    /// Structural equality, independent of key order.
    DeepEqual,
    /// Structural inequality.
    NotDeepEqual,
    /// Fact-is-string predicate equals the value.
    IsString,
    /// Fact-is-array predicate equals the value.
    IsArray,
    /// Fact-is-object predicate equals the value.
    IsObject,
}

impl Operator {
    /// Name as written in rule files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::LessThan => "lessThan",
            Self::LessThanInclusive => "lessThanInclusive",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanInclusive => "greaterThanInclusive",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Contains => "contains",
            Self::DoesNotContain => "doesNotContain",
            Self::ArrayEqual => "arrayEqual",
            Self::ArrayNotEqual => "arrayNotEqual",
            Self::Truthy => "truthy",
            Self::DeepEqual => "deepEqual",
            Self::NotDeepEqual => "notDeepEqual",
            Self::IsString => "isString",
            Self::IsArray => "isArray",
            Self::IsObject => "isObject",
        }
    }

    /// Apply the operator to a fact value and a rule value.
    #[must_use]
    pub fn apply(&self, fact: &Value, value: &Value) -> bool {
        match self {
            Self::Equal => scalar_eq(fact, value),
            Self::NotEqual => !scalar_eq(fact, value),
            Self::LessThan => compare(fact, value).is_some_and(Ordering::is_lt),
            Self::LessThanInclusive => compare(fact, value).is_some_and(Ordering::is_le),
            Self::GreaterThan => compare(fact, value).is_some_and(Ordering::is_gt),
            Self::GreaterThanInclusive => compare(fact, value).is_some_and(Ordering::is_ge),
            Self::In => value
                .as_array()
                .is_some_and(|items| items.iter().any(|v| scalar_eq(fact, v))),
            Self::NotIn => value
                .as_array()
                .is_some_and(|items| !items.iter().any(|v| scalar_eq(fact, v))),
            Self::Contains => fact
                .as_array()
                .is_some_and(|items| items.iter().any(|v| scalar_eq(v, value))),
            Self::DoesNotContain => fact
                .as_array()
                .is_some_and(|items| !items.iter().any(|v| scalar_eq(v, value))),
            Self::ArrayEqual => array_equal(fact, value),
            Self::ArrayNotEqual => !array_equal(fact, value),
            Self::Truthy => value.as_bool().is_some_and(|b| b == is_truthy(fact)),
            Self::DeepEqual => fact == value,
            Self::NotDeepEqual => fact != value,
            Self::IsString => value.as_bool().is_some_and(|b| b == fact.is_string()),
            Self::IsArray => value.as_bool().is_some_and(|b| b == fact.is_array()),
            Self::IsObject => value.as_bool().is_some_and(|b| b == fact.is_object()),
        }
    }
}

impl FromStr for Operator {
    type Err = RuleLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let operator = match s {
            "equal" => Self::Equal,
            "notEqual" => Self::NotEqual,
            "lessThan" => Self::LessThan,
            "lessThanInclusive" => Self::LessThanInclusive,
            "greaterThan" => Self::GreaterThan,
            "greaterThanInclusive" => Self::GreaterThanInclusive,
            "in" => Self::In,
            "notIn" => Self::NotIn,
            "contains" => Self::Contains,
            "doesNotContain" => Self::DoesNotContain,
            "arrayEqual" => Self::ArrayEqual,
            "arrayNotEqual" => Self::ArrayNotEqual,
            "truthy" => Self::Truthy,
            "deepEqual" => Self::DeepEqual,
            "notDeepEqual" => Self::NotDeepEqual,
            "isString" => Self::IsString,
            "isArray" => Self::IsArray,
            "isObject" => Self::IsObject,
            other => return Err(RuleLoadError::UnknownOperator(other.to_string())),
        };
        Ok(operator)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Equality on scalars only; arrays and objects never compare equal.
fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        (Value::Number(x), Value::Number(y)) => match (to_decimal(a), to_decimal(b)) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn array_equal(fact: &Value, value: &Value) -> bool {
    match fact {
        Value::Array(items) => items.len() == 1 && scalar_eq(&items[0], value),
        scalar => scalar_eq(scalar, value),
    }
}

/// Numeric comparison; numeric strings are accepted on either side.
fn compare(fact: &Value, value: &Value) -> Option<Ordering> {
    Some(to_decimal(fact)?.cmp(&to_decimal(value)?))
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
