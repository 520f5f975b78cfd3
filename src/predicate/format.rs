//! Format template and argument list
//!
//! This is the request handed to the consuming engine: a template with
//! positional placeholders plus the ordered arguments that fill them.
//!
//! # Placeholders
//!
//! | token  | argument          |
//! |--------|-------------------|
//! | `%K`   | `Argument::Key`   |
//! | `%@`   | `Argument::Object`|
//! | `%lld` | `Argument::Int64` |
//! | `%d`   | `Argument::Int`   |
//! | `%%`   | literal `%`       |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{PredicateError, PredicateResult};

/// Predicate that always evaluates true
pub const TRUE_PREDICATE: &str = "TRUEPREDICATE";

/// Predicate that always evaluates false
pub const FALSE_PREDICATE: &str = "FALSEPREDICATE";

/// Placeholder kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Named field
    Key,
    /// Generic object
    Object,
    /// 64-bit integer literal
    Int64,
    /// Plain integer literal
    Int,
}

impl Placeholder {
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Key => "%K",
            Placeholder::Object => "%@",
            Placeholder::Int64 => "%lld",
            Placeholder::Int => "%d",
        }
    }
}

/// A positional argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Argument {
    Key(String),
    Object(Value),
    Int64(i64),
    Int(i64),
}

impl Argument {
    /// Returns the only placeholder this argument may fill
    pub fn placeholder(&self) -> Placeholder {
        match self {
            Argument::Key(_) => Placeholder::Key,
            Argument::Object(_) => Placeholder::Object,
            Argument::Int64(_) => Placeholder::Int64,
            Argument::Int(_) => Placeholder::Int,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Argument::Key(_) => "key",
            Argument::Object(_) => "object",
            Argument::Int64(_) => "int64",
            Argument::Int(_) => "int",
        }
    }

    /// Write the argument the way the engine prints it
    fn describe_into(&self, out: &mut String) {
        match self {
            Argument::Key(key) => out.push_str(key),
            Argument::Object(value) => describe_value(value, out),
            Argument::Int64(n) | Argument::Int(n) => out.push_str(&n.to_string()),
        }
    }
}

fn describe_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str(super::value::NULL_TOKEN),
        Value::Bool(b) => out.push(if *b { '1' } else { '0' }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
        Value::Array(items) => {
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                describe_value(item, out);
            }
            out.push('}');
        }
        Value::Object(_) => out.push_str(&value.to_string()),
    }
}

/// Lexical pieces of a template
#[derive(Debug, Clone, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Percent,
    Placeholder(Placeholder),
}

fn scan(template: &str) -> PredicateResult<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find('%') {
        let at = offset + pos;
        if at > text_start {
            segments.push(Segment::Text(&template[text_start..at]));
        }

        let tail = &template[at..];
        let (segment, len) = if tail.starts_with("%%") {
            (Segment::Percent, 2)
        } else if tail.starts_with("%K") {
            (Segment::Placeholder(Placeholder::Key), 2)
        } else if tail.starts_with("%@") {
            (Segment::Placeholder(Placeholder::Object), 2)
        } else if tail.starts_with("%lld") {
            (Segment::Placeholder(Placeholder::Int64), 4)
        } else if tail.starts_with("%d") {
            (Segment::Placeholder(Placeholder::Int), 2)
        } else {
            return Err(PredicateError::MalformedTemplate {
                offset: at,
                reason: format!("unknown placeholder '{}'", tail.chars().take(4).collect::<String>()),
            });
        };

        segments.push(segment);
        offset = at + len;
        text_start = offset;
        rest = &template[offset..];
    }

    if text_start < template.len() {
        segments.push(Segment::Text(&template[text_start..]));
    }
    Ok(segments)
}

/// Escape literal text so it can be embedded in a template
pub fn escape_template_text(text: &str) -> String {
    text.replace('%', "%%")
}

/// A rendered predicate: template plus ordered arguments
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Format {
    template: String,
    arguments: Vec<Argument>,
}

impl Format {
    /// Create a format from parts. Alignment is not checked here.
    pub fn new(template: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            template: template.into(),
            arguments,
        }
    }

    /// The universal-true predicate
    pub fn true_predicate() -> Self {
        Self::new(TRUE_PREDICATE, Vec::new())
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.template.push_str(text);
    }

    pub(crate) fn push_argument(&mut self, argument: Argument) {
        self.template.push_str(argument.placeholder().token());
        self.arguments.push(argument);
    }

    /// Append another format's template and arguments
    pub(crate) fn append(&mut self, other: &Format) {
        self.template.push_str(&other.template);
        self.arguments.extend(other.arguments.iter().cloned());
    }

    /// Placeholders of the template, in order
    pub fn placeholders(&self) -> PredicateResult<Vec<Placeholder>> {
        Ok(scan(&self.template)?
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(p) => Some(p),
                _ => None,
            })
            .collect())
    }

    /// Verify every placeholder has exactly one argument of its kind
    pub fn check_alignment(&self) -> PredicateResult<()> {
        let placeholders = self.placeholders()?;
        if placeholders.len() != self.arguments.len() {
            return Err(PredicateError::ArgumentCountMismatch {
                placeholders: placeholders.len(),
                arguments: self.arguments.len(),
            });
        }

        for (index, (placeholder, argument)) in
            placeholders.iter().zip(&self.arguments).enumerate()
        {
            if argument.placeholder() != *placeholder {
                return Err(PredicateError::ArgumentKindMismatch {
                    index,
                    placeholder: placeholder.token(),
                    argument: argument.kind(),
                });
            }
        }
        Ok(())
    }

    /// Substitute the arguments into the template.
    ///
    /// Produces the engine's textual form, e.g. `age > 18`.
    pub fn describe(&self) -> PredicateResult<String> {
        self.check_alignment()?;

        let mut out = String::with_capacity(self.template.len() + 16);
        let mut arguments = self.arguments.iter();
        for segment in scan(&self.template)? {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Percent => out.push('%'),
                Segment::Placeholder(_) => {
                    // Alignment was checked above
                    if let Some(argument) = arguments.next() {
                        argument.describe_into(&mut out);
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Falls back to the bare template when the arguments do not line up
impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.describe() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str(&self.template),
        }
    }
}
