//! Predicate subsystem
//!
//! Builds textual predicates for an external query engine: a format
//! template with positional placeholders plus the typed arguments that fill
//! them. Nothing here evaluates a predicate.
//!
//! # Pipeline
//!
//! 1. `PredicateBuilder` accumulates conditions
//! 2. `build()` produces an immutable `Expression`
//! 3. `render()` walks the expression into a `Format`
//! 4. `Format::describe()` substitutes arguments for the textual form
//!
//! # Invariants
//!
//! - Every placeholder is pushed together with its argument; `NULL` is the
//!   only value token without one
//! - Field names always travel as `%K` arguments, never as template text
//! - Rendering is pure and repeatable
//! - Combination and wrapping never mutate their inputs

mod ast;
mod builder;
mod errors;
mod format;
mod relation;
mod render;
pub mod subquery;
mod value;

pub use ast::{Condition, Expression, RawFragment, SubqueryExpression};
pub use builder::PredicateBuilder;
pub use errors::{PredicateError, PredicateResult};
pub use format::{escape_template_text, Argument, Format, Placeholder, FALSE_PREDICATE, TRUE_PREDICATE};
pub use relation::{Aggregation, Conjunction, Relation, RelationKind, StringOperator, StringRelation};
pub use value::{TypedValue, ValueFormat, NULL_TOKEN};
