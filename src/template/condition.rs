// ABOUTME: Comparison rules evaluated against instance variables
// ABOUTME: Supports eq/ne/gt/lt/gte/lte with $name variable references

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::resolver::lookup;
use crate::model::Variables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

impl Operator {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "eq" | "equals" | "==" => Some(Operator::Equals),
            "ne" | "not_equals" | "!=" => Some(Operator::NotEquals),
            "gt" | "greater_than" | ">" => Some(Operator::GreaterThan),
            "lt" | "less_than" | "<" => Some(Operator::LessThan),
            "gte" | "greater_or_equal" | ">=" => Some(Operator::GreaterOrEqual),
            "lte" | "less_or_equal" | "<=" => Some(Operator::LessOrEqual),
            _ => None,
        }
    }
}

/// A `{operator, left, right}` rule. Operands that are strings starting with
/// `$` are variable references; anything else is a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default = "empty_operand")]
    pub left: Value,
    #[serde(default = "empty_operand")]
    pub right: Value,
}

fn default_operator() -> String {
    "eq".to_string()
}

fn empty_operand() -> Value {
    Value::String(String::new())
}

impl Condition {
    pub fn new(operator: impl Into<String>, left: Value, right: Value) -> Self {
        Self {
            operator: operator.into(),
            left,
            right,
        }
    }

    /// Read a condition from a raw configuration value. Malformed input
    /// yields a rule that never matches.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| Self {
            operator: String::new(),
            left: Value::Null,
            right: Value::Null,
        })
    }

    /// Evaluate the rule. Unknown operators evaluate to false.
    pub fn evaluate(&self, variables: &Variables) -> bool {
        let Some(operator) = Operator::parse(&self.operator) else {
            return false;
        };

        let left = operand(&self.left, variables);
        let right = operand(&self.right, variables);

        match operator {
            Operator::Equals => equals(&left, &right),
            Operator::NotEquals => !equals(&left, &right),
            Operator::GreaterThan => compare(&left, &right) == Some(Ordering::Greater),
            Operator::LessThan => compare(&left, &right) == Some(Ordering::Less),
            Operator::GreaterOrEqual => matches!(
                compare(&left, &right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::LessOrEqual => matches!(
                compare(&left, &right),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn operand(raw: &Value, variables: &Variables) -> Value {
    match raw {
        Value::String(s) if s.starts_with('$') => {
            lookup(variables, &s[1..]).cloned().unwrap_or(Value::Null)
        }
        other => other.clone(),
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(l), Some(r)) if left.is_number() && right.is_number() => l == r,
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
