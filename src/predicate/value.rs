//! Typed comparison values and the value formatter
//!
//! The value shape decides the placeholder token and whether an argument is
//! bound. Shapes are fixed when the value is constructed, so formatting
//! never inspects types at runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::format::{Argument, Placeholder};

/// Literal keyword rendered for a null comparison value
pub const NULL_TOKEN: &str = "NULL";

/// A comparison value tagged with its shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// Renders the `NULL` keyword and binds nothing
    Null,
    /// Generic object placeholder
    Scalar(Value),
    /// Dedicated integer placeholder
    Integer64(i64),
    /// Boxed as the number `1` or `0`
    Boolean(bool),
    /// Bound as one array argument, never one argument per element
    Collection(Vec<Value>),
}

/// Output of the value formatter
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFormat {
    /// Token written into the template
    pub token: &'static str,
    /// Argument matching the token, `None` only for `NULL`
    pub argument: Option<Argument>,
}

impl TypedValue {
    pub fn null() -> Self {
        TypedValue::Null
    }

    pub fn scalar(value: impl Into<Value>) -> Self {
        TypedValue::Scalar(value.into())
    }

    pub fn integer(value: i64) -> Self {
        TypedValue::Integer64(value)
    }

    pub fn boolean(value: bool) -> Self {
        TypedValue::Boolean(value)
    }

    /// Build a collection from any ordered or unordered sequence
    pub fn collection<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        TypedValue::Collection(items.into_iter().map(Into::into).collect())
    }

    /// Returns true for the `NULL` shape
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Map this value to its placeholder token and bound argument.
    ///
    /// Exactly one argument is produced for every shape except `Null`.
    pub fn format(&self) -> ValueFormat {
        match self {
            TypedValue::Null => ValueFormat {
                token: NULL_TOKEN,
                argument: None,
            },
            TypedValue::Scalar(value) => ValueFormat {
                token: Placeholder::Object.token(),
                argument: Some(Argument::Object(value.clone())),
            },
            TypedValue::Integer64(value) => ValueFormat {
                token: Placeholder::Int64.token(),
                argument: Some(Argument::Int64(*value)),
            },
            TypedValue::Boolean(value) => ValueFormat {
                token: Placeholder::Object.token(),
                argument: Some(Argument::Object(Value::from(u8::from(*value)))),
            },
            TypedValue::Collection(items) => ValueFormat {
                token: Placeholder::Object.token(),
                argument: Some(Argument::Object(Value::Array(items.clone()))),
            },
        }
    }
}

impl From<Value> for TypedValue {
    /// Classify a JSON value. Anything unrecognised is a generic scalar.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => TypedValue::Null,
            Value::Bool(b) => TypedValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => TypedValue::Integer64(i),
                None => TypedValue::Scalar(Value::Number(n)),
            },
            Value::Array(items) => TypedValue::Collection(items),
            other => TypedValue::Scalar(other),
        }
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::Integer64(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::Integer64(i64::from(value))
    }
}

impl From<u32> for TypedValue {
    fn from(value: u32) -> Self {
        TypedValue::Integer64(i64::from(value))
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::Boolean(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        TypedValue::Scalar(Value::from(value))
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::Scalar(Value::from(value))
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::Scalar(Value::from(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for TypedValue {
    fn from(items: Vec<T>) -> Self {
        TypedValue::collection(items)
    }
}

impl<T: Into<TypedValue>> From<Option<T>> for TypedValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TypedValue::Null)
    }
}
