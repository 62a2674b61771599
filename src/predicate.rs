// src/predicate.rs

//! Predicate expressions over object fields
//!
//! A closed tagged union of predicate node kinds, shared by the asset-mapping
//! side and the binding side of the pipeline. Callers compose predicates with
//! the constructor helpers; stores evaluate them against anything that
//! implements [`FieldLookup`] without imperative iteration at call sites.

use serde_json::Value;

/// A boolean query over named fields and binding parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Always true
    True,
    /// Conjunction of all operands
    And(Vec<Expr>),
    /// Disjunction of any operand
    Or(Vec<Expr>),
    /// Negation
    Not(Box<Expr>),
    /// Comparison against a named field of the target
    Field { name: String, op: Comparison },
    /// Comparison against a named entry of the target's parameter set
    Parameter { name: String, op: Comparison },
}

/// Comparison kinds applicable to a field value
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// Strict identity: type and value must match
    Same(Value),
    /// Loose equality: scalars compare equal after string coercion
    Equals(Value),
    /// Negated strict identity
    NotSame(Value),
    /// Negated loose equality
    NotEquals(Value),
    /// String value starts with the given prefix
    StartsWith(String),
    /// String value ends with the given suffix
    EndsWith(String),
    /// String value contains the given substring
    Contains(String),
}

impl Comparison {
    /// Evaluate this comparison against a field value
    ///
    /// An absent field (`None`) only satisfies the negated kinds.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Same(expected) => value == Some(expected),
            Self::NotSame(expected) => value != Some(expected),
            Self::Equals(expected) => match value {
                Some(actual) => loosely_equal(actual, expected),
                None => false,
            },
            Self::NotEquals(expected) => match value {
                Some(actual) => !loosely_equal(actual, expected),
                None => true,
            },
            Self::StartsWith(prefix) => as_str(value).is_some_and(|s| s.starts_with(prefix.as_str())),
            Self::EndsWith(suffix) => as_str(value).is_some_and(|s| s.ends_with(suffix.as_str())),
            Self::Contains(needle) => as_str(value).is_some_and(|s| s.contains(needle.as_str())),
        }
    }
}

fn as_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

/// Scalar equality with string coercion, so `"1"` equals `1` and `"true"`
/// equals `true`
fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (scalar_to_string(a), scalar_to_string(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Anything a predicate can be evaluated against
pub trait FieldLookup {
    /// Value of a named field, or `None` if the target has no such field
    fn field(&self, name: &str) -> Option<Value>;

    /// Value of a named parameter; only bindings carry parameters
    fn parameter(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl Expr {
    pub fn and(operands: Vec<Expr>) -> Self {
        Self::And(operands)
    }

    pub fn or(operands: Vec<Expr>) -> Self {
        Self::Or(operands)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Expr) -> Self {
        Self::Not(Box::new(operand))
    }

    pub fn field(name: &str, op: Comparison) -> Self {
        Self::Field { name: name.to_string(), op }
    }

    pub fn parameter(name: &str, op: Comparison) -> Self {
        Self::Parameter { name: name.to_string(), op }
    }

    /// Shorthand for a strict field equality
    pub fn same(name: &str, value: impl Into<Value>) -> Self {
        Self::field(name, Comparison::Same(value.into()))
    }

    /// Shorthand for a loose field equality
    pub fn equals(name: &str, value: impl Into<Value>) -> Self {
        Self::field(name, Comparison::Equals(value.into()))
    }

    /// Shorthand for a field suffix match
    pub fn ends_with(name: &str, suffix: &str) -> Self {
        Self::field(name, Comparison::EndsWith(suffix.to_string()))
    }

    /// Evaluate the predicate against a target
    pub fn evaluate(&self, target: &impl FieldLookup) -> bool {
        match self {
            Self::True => true,
            Self::And(operands) => operands.iter().all(|e| e.evaluate(target)),
            Self::Or(operands) => operands.iter().any(|e| e.evaluate(target)),
            Self::Not(operand) => !operand.evaluate(target),
            Self::Field { name, op } => op.matches(target.field(name).as_ref()),
            Self::Parameter { name, op } => op.matches(target.parameter(name).as_ref()),
        }
    }
}
