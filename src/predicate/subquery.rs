//! Subquery scoping
//!
//! Structured expressions are scoped while rendering (see `render`). The
//! lexical rewrite below only serves raw fragments, whose field references
//! are known only as text.
//!
//! The rewrite is purely lexical. A string literal that itself reads like
//! `word operator` (e.g. `"x > 5"`) is rewritten too.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::{PredicateError, PredicateResult};

/// Variable bound when none is configured
pub const DEFAULT_VARIABLE: &str = "s";

/// A field path immediately followed by whitespace and a comparison operator
const FIELD_REFERENCE_PATTERN: &str = r"(\w+(?:\.\w+)*)\s+(>=|<=|!=|==|>|<|=|IN)";

static FIELD_REFERENCE: OnceLock<Regex> = OnceLock::new();

fn field_reference() -> &'static Regex {
    FIELD_REFERENCE.get_or_init(|| {
        // Constant pattern; failing to compile is a programming error
        Regex::new(FIELD_REFERENCE_PATTERN).expect("field reference pattern must compile")
    })
}

/// Prefix every field reference in `text` with `$variable.`
///
/// Insertions are applied left to right, each shifting the offsets of the
/// matches after it by the length of the inserted prefix.
pub fn rewrite_field_references(text: &str, variable: &str) -> String {
    let prefix = format!("${}.", variable);
    let mut rewritten = text.to_string();
    let mut correction = 0;

    for found in field_reference().find_iter(text) {
        rewritten.insert_str(found.start() + correction, &prefix);
        correction += prefix.len();
    }
    rewritten
}

/// Check that `name` can be bound as `$name`
pub fn validate_variable(name: &str) -> PredicateResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(PredicateError::InvalidVariable(name.to_string()))
    }
}

/// Validated subquery variable name, without the `$`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> PredicateResult<Self> {
        let name = name.into();
        validate_variable(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self(DEFAULT_VARIABLE.to_string())
    }
}

impl TryFrom<String> for Variable {
    type Error = PredicateError;

    fn try_from(name: String) -> PredicateResult<Self> {
        Self::new(name)
    }
}

impl From<Variable> for String {
    fn from(variable: Variable) -> Self {
        variable.0
    }
}

impl PartialEq<str> for Variable {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Variable {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
