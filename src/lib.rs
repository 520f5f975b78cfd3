//! predicate-builder - fluent builder for parameterized query predicates
//!
//! Assembles `field relation value` conditions, AND/OR/NOT compounds,
//! aggregation quantifiers and counting subqueries into a format template
//! plus argument list for an external query engine.

pub mod config;
pub mod observability;
pub mod predicate;

pub use config::BuilderConfig;
pub use predicate::{
    Aggregation, Argument, Conjunction, Expression, Format, PredicateBuilder, PredicateError,
    PredicateResult, Relation, StringRelation, TypedValue,
};
