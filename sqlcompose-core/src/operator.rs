//! SQL comparison operators and condition tuples for WHERE/HAVING templates

use std::fmt::{self, Display};

use crate::Value;

/// Type-safe SQL operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(&'static str);

impl Operator {
    pub const GT: Self = Operator(">");
    pub const LT: Self = Operator("<");
    pub const EQ: Self = Operator("=");
    pub const NEQ: Self = Operator("!=");
    pub const GTE: Self = Operator(">=");
    pub const LTE: Self = Operator("<=");
    pub const LIKE: Self = Operator("LIKE");
    pub const ILIKE: Self = Operator("ILIKE");
    pub const IN: Self = Operator("IN");
    pub const NOT_IN: Self = Operator("NOT IN");
    pub const IS_NULL: Self = Operator("IS NULL");
    pub const IS_NOT_NULL: Self = Operator("IS NOT NULL");

    /// Create a custom operator for database-specific operations
    ///
    /// # Examples
    /// ```
    /// use sqlcompose_core::Operator;
    ///
    /// // PostgreSQL full-text search
    /// let fts_op = Operator::custom("@@");
    /// assert_eq!(fts_op.as_str(), "@@");
    /// ```
    pub const fn custom(op: &'static str) -> Self {
        Operator(op)
    }

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &str {
        self.0
    }

    /// Operators that take no right-hand operand
    pub fn is_unary(&self) -> bool {
        *self == Self::IS_NULL || *self == Self::IS_NOT_NULL
    }

    /// Operators whose operand is a parenthesized list
    pub fn is_list(&self) -> bool {
        *self == Self::IN || *self == Self::NOT_IN
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for types that can be converted to SQL operators
pub trait IntoOperator {
    fn into_operator(self) -> Operator;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Operator {
        self
    }
}

/// Common spellings map to the constants; anything else is passed through verbatim
impl IntoOperator for &'static str {
    fn into_operator(self) -> Operator {
        match self {
            ">" => Operator::GT,
            "<" => Operator::LT,
            "=" => Operator::EQ,
            "!=" | "<>" => Operator::NEQ,
            ">=" => Operator::GTE,
            "<=" => Operator::LTE,
            "LIKE" | "like" => Operator::LIKE,
            "ILIKE" | "ilike" => Operator::ILIKE,
            "IN" | "in" => Operator::IN,
            "NOT IN" | "not in" => Operator::NOT_IN,
            "IS NULL" | "is null" => Operator::IS_NULL,
            "IS NOT NULL" | "is not null" => Operator::IS_NOT_NULL,
            other => Operator::custom(other),
        }
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const GT: Operator = Operator::GT;
    pub const LT: Operator = Operator::LT;
    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const GTE: Operator = Operator::GTE;
    pub const LTE: Operator = Operator::LTE;
    pub const LIKE: Operator = Operator::LIKE;
    pub const ILIKE: Operator = Operator::ILIKE;
    pub const IN: Operator = Operator::IN;
    pub const NOT_IN: Operator = Operator::NOT_IN;
    pub const IS_NULL: Operator = Operator::IS_NULL;
    pub const IS_NOT_NULL: Operator = Operator::IS_NOT_NULL;
}

/// Trait for condition tuples that lower to an expression template plus arguments
pub trait IntoCondition {
    fn into_condition(self) -> (String, Vec<Value>);
}

// Shorthand equality: where_cond(("age", 18))
impl<T> IntoCondition for (&str, T)
where
    T: Into<Value>,
{
    fn into_condition(self) -> (String, Vec<Value>) {
        condition(self.0, Operator::EQ, self.1.into())
    }
}

// Explicit operators: where_cond(("age", op::GT, 18)) or where_cond(("age", ">", 18))
impl<T, O> IntoCondition for (&str, O, T)
where
    T: Into<Value>,
    O: IntoOperator,
{
    fn into_condition(self) -> (String, Vec<Value>) {
        condition(self.0, self.1.into_operator(), self.2.into())
    }
}

fn condition(column: &str, operator: Operator, value: Value) -> (String, Vec<Value>) {
    if operator.is_unary() {
        return (format!("{} {}", column, operator), Vec::new());
    }

    match value {
        Value::Array(items) if operator.is_list() && items.is_empty() => {
            // nothing is a member of an empty list
            let constant = if operator == Operator::NOT_IN { "1=1" } else { "1=0" };
            (constant.to_string(), Vec::new())
        }
        Value::Array(items) if operator.is_list() => {
            let markers = vec!["?"; items.len()].join(", ");
            (format!("{} {} ({})", column, operator, markers), items)
        }
        value => (format!("{} {} ?", column, operator), vec![value]),
    }
}
