//! Predicate expression tree
//!
//! Immutable structured form of a predicate. Builders produce it with
//! `build()`, and `render()` turns it into a [`Format`] for the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{PredicateError, PredicateResult};
use super::format::Format;
use super::relation::{Aggregation, Conjunction, Relation, RelationKind};
use super::render::Renderer;
use super::subquery::Variable;
use super::value::TypedValue;

/// One atomic comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Quantifier over a to-many relationship, if any
    pub aggregation: Option<Aggregation>,
    /// Field name
    pub field: String,
    /// Field reached through one relationship hop (`field.sub_field`)
    pub sub_field: Option<String>,
    pub relation: RelationKind,
    pub value: TypedValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, relation: impl Into<RelationKind>, value: impl Into<TypedValue>) -> Self {
        Self {
            aggregation: None,
            field: field.into(),
            sub_field: None,
            relation: relation.into(),
            value: value.into(),
        }
    }

    /// Traverse one relationship hop
    pub fn with_sub_field(mut self, sub_field: impl Into<String>) -> Self {
        self.sub_field = Some(sub_field.into());
        self
    }

    /// Quantify over a to-many relationship
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Field path as written in the textual form, e.g. `owner.name`
    pub fn path(&self) -> String {
        match &self.sub_field {
            Some(sub) => format!("{}.{}", self.field, sub),
            None => self.field.clone(),
        }
    }
}

/// Count of related elements satisfying an inner predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubqueryExpression {
    /// Relationship collection being iterated
    pub source_field: String,
    /// Per-element variable, validated on construction and deserialization
    pub variable: Variable,
    /// Predicate over a single element, fields relative to the element
    pub inner: Box<Expression>,
    pub count_relation: Relation,
    pub count_threshold: i64,
}

impl SubqueryExpression {
    /// The inner predicate with every field reference scoped to the variable
    pub fn scoped_inner(&self) -> Format {
        let mut renderer = Renderer::new();
        renderer.push_scoped(&self.inner, self.variable.as_str());
        renderer.finish()
    }
}

/// A pre-rendered fragment appended as-is
///
/// The format is validated on construction and its description cached, so
/// rendering a tree that contains it can not fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Format", into = "Format")]
pub struct RawFragment {
    format: Format,
    text: String,
}

impl RawFragment {
    pub fn new(format: Format) -> PredicateResult<Self> {
        let text = format.describe()?;
        Ok(Self { format, text })
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Textual form with arguments substituted
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl TryFrom<Format> for RawFragment {
    type Error = PredicateError;

    fn try_from(format: Format) -> PredicateResult<Self> {
        Self::new(format)
    }
}

impl From<RawFragment> for Format {
    fn from(fragment: RawFragment) -> Self {
        fragment.format
    }
}

/// Structured predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Always true
    True,
    Comparison(Condition),
    Compound {
        conjunction: Conjunction,
        operands: Vec<Expression>,
    },
    Not(Box<Expression>),
    Subquery(SubqueryExpression),
    Raw(RawFragment),
}

impl Expression {
    pub fn compound(conjunction: Conjunction, operands: Vec<Expression>) -> Self {
        Expression::Compound {
            conjunction,
            operands,
        }
    }

    pub fn negate(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    /// Render to a template and argument list
    pub fn render(&self) -> Format {
        let mut renderer = Renderer::new();
        renderer.push(self);
        renderer.finish()
    }
}

impl From<Condition> for Expression {
    fn from(condition: Condition) -> Self {
        Expression::Comparison(condition)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.render(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::format::Argument;
    use crate::predicate::relation::StringRelation;
    use serde_json::json;

    #[test]
    fn test_condition_path() {
        let condition = Condition::new("owner", Relation::Equal, "x").with_sub_field("name");
        assert_eq!(condition.path(), "owner.name");
        assert_eq!(Condition::new("age", Relation::Less, 3i64).path(), "age");
    }

    #[test]
    fn test_render_single_condition() {
        let expr = Expression::from(Condition::new("age", Relation::Greater, 18i64));
        let format = expr.render();
        assert_eq!(format.template(), "%K > %lld");
        assert_eq!(
            format.arguments(),
            &[Argument::Key("age".into()), Argument::Int64(18)]
        );
        assert_eq!(expr.to_string(), "age > 18");
    }

    #[test]
    fn test_render_sub_field() {
        let expr = Expression::from(
            Condition::new("owner", StringRelation::begins_with(true, false), "An")
                .with_sub_field("name"),
        );
        let format = expr.render();
        assert_eq!(format.template(), "%K.%K BEGINSWITH[c] %@");
        assert_eq!(
            format.arguments(),
            &[
                Argument::Key("owner".into()),
                Argument::Key("name".into()),
                Argument::Object(json!("An")),
            ]
        );
    }

    #[test]
    fn test_render_aggregation() {
        let expr = Expression::from(
            Condition::new("tags", Relation::Equal, "rust")
                .with_sub_field("title")
                .with_aggregation(Aggregation::Any),
        );
        assert_eq!(expr.render().template(), "ANY %K.%K == %@");
        assert_eq!(expr.to_string(), "ANY tags.title == \"rust\"");
    }

    #[test]
    fn test_render_null_value() {
        let expr = Expression::from(Condition::new("deleted_at", Relation::Equal, TypedValue::Null));
        let format = expr.render();
        assert_eq!(format.template(), "%K == NULL");
        assert_eq!(format.arguments().len(), 1);
    }

    #[test]
    fn test_raw_fragment_rejects_misaligned_format() {
        let bad = Format::new("%K == %@", vec![Argument::Key("a".into())]);
        assert!(RawFragment::new(bad).is_err());

        let good = Format::new("%K == %@", vec![Argument::Key("a".into()), Argument::Object(json!(1))]);
        assert_eq!(RawFragment::new(good).unwrap().text(), "a == 1");
    }

    #[test]
    fn test_expression_serializes() {
        let expr = Expression::negate(Expression::from(Condition::new("age", Relation::Less, 3i64)));
        let value = serde_json::to_value(&expr).unwrap();
        let back: Expression = serde_json::from_value(value).unwrap();
        assert_eq!(back, expr);
    }

    #[test]
    fn test_subquery_variable_checked_on_deserialize() {
        let expr = Expression::Subquery(SubqueryExpression {
            source_field: "items".into(),
            variable: Variable::default(),
            inner: Box::new(Expression::from(Condition::new("price", Relation::Greater, 1i64))),
            count_relation: Relation::Greater,
            count_threshold: 0,
        });
        let mut value = serde_json::to_value(&expr).unwrap();
        assert_eq!(value["Subquery"]["variable"], json!("s"));

        value["Subquery"]["variable"] = json!("a%");
        assert!(serde_json::from_value::<Expression>(value).is_err());
    }
}
