//! Predicate builder
//!
//! Accumulates conditions joined by one conjunction, plus an optional nested
//! expression produced by combination or wrapping. Condition-adding methods
//! mutate the builder and return it for chaining. `build` and `render` never
//! mutate, so calling them repeatedly yields identical output.
//!
//! ```ignore
//! let mut adults = PredicateBuilder::new();
//! adults
//!     .add("age", Relation::GreaterOrEqual, 18i64)
//!     .add_string("name", StringRelation::like(true, true), "an*");
//!
//! let format = adults.render(); // "%K >= %lld AND %K LIKE[cd] %@"
//! ```

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use serde_json::Value;

use crate::config::BuilderConfig;
use crate::observability::{log_event, log_event_with_fields, Event, Logger, Severity};

use super::ast::{Condition, Expression, RawFragment, SubqueryExpression};
use super::errors::PredicateResult;
use super::format::Format;
use super::relation::{Aggregation, Conjunction, Relation, StringRelation};
use super::subquery::Variable;
use super::value::TypedValue;

/// Mutable accumulator of predicate conditions
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    conjunction: Conjunction,
    conditions: Vec<Expression>,
    /// Already-built expression shared with the builder it came from
    nested: Option<Arc<Expression>>,
    subquery_variable: Variable,
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PredicateBuilder {
    /// Create a builder joining its conditions with AND
    pub fn new() -> Self {
        Self::with_conjunction(Conjunction::And)
    }

    /// Create a builder joining its conditions with `conjunction`
    pub fn with_conjunction(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            conditions: Vec::new(),
            nested: None,
            subquery_variable: Variable::default(),
        }
    }

    /// Create a builder from configuration.
    ///
    /// The configuration is validated first, so a builder never holds a
    /// subquery variable that can not be bound.
    pub fn with_config(config: &BuilderConfig) -> PredicateResult<Self> {
        config.validate()?;
        Ok(Self {
            subquery_variable: Variable::new(config.subquery_variable.as_str())?,
            ..Self::with_conjunction(config.conjunction)
        })
    }

    /// A fresh builder carrying this builder's settings but no conditions
    fn derived(&self) -> Self {
        Self {
            conjunction: Conjunction::And,
            conditions: Vec::new(),
            nested: None,
            subquery_variable: self.subquery_variable.clone(),
        }
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    /// Number of directly accumulated conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// True when there are no conditions and no nested expression
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.nested.is_none()
    }

    // ==================
    // Conditions
    // ==================

    /// `%K <op> <value>`
    pub fn add(
        &mut self,
        key: impl Into<String>,
        relation: Relation,
        value: impl Into<TypedValue>,
    ) -> &mut Self {
        self.push_condition(Condition::new(key, relation, value))
    }

    /// `%K.%K <op> <value>`, through one relationship hop
    pub fn add_sub(
        &mut self,
        key: impl Into<String>,
        sub_key: impl Into<String>,
        relation: Relation,
        value: impl Into<TypedValue>,
    ) -> &mut Self {
        self.push_condition(Condition::new(key, relation, value).with_sub_field(sub_key))
    }

    /// `%K LIKE[cd] %@` and the other string relations
    pub fn add_string(
        &mut self,
        key: impl Into<String>,
        relation: StringRelation,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_condition(Condition::new(key, relation, string_value(value)))
    }

    /// `%K.%K LIKE[cd] %@`
    pub fn add_string_sub(
        &mut self,
        key: impl Into<String>,
        sub_key: impl Into<String>,
        relation: StringRelation,
        value: impl Into<String>,
    ) -> &mut Self {
        self.push_condition(
            Condition::new(key, relation, string_value(value)).with_sub_field(sub_key),
        )
    }

    /// `ANY|SOME|ALL|NONE %K[.%K] <op> <value>`
    pub fn add_aggregation(
        &mut self,
        aggregation: Aggregation,
        key: impl Into<String>,
        sub_key: Option<&str>,
        relation: Relation,
        value: impl Into<TypedValue>,
    ) -> &mut Self {
        let mut condition = Condition::new(key, relation, value).with_aggregation(aggregation);
        if let Some(sub) = sub_key {
            condition = condition.with_sub_field(sub);
        }
        self.push_condition(condition)
    }

    /// Append a pre-rendered fragment as one condition.
    ///
    /// Prefer the typed methods; fragments are only scoped lexically when
    /// wrapped into a subquery.
    pub fn add_raw(&mut self, format: Format) -> PredicateResult<&mut Self> {
        let fragment = RawFragment::new(format)?;
        if Logger::enabled(Severity::Trace) {
            log_event_with_fields(Event::RawFragmentAdded, &[("text", fragment.text())]);
        }
        self.conditions.push(Expression::Raw(fragment));
        Ok(self)
    }

    fn push_condition(&mut self, condition: Condition) -> &mut Self {
        if Logger::enabled(Severity::Trace) {
            log_event_with_fields(
                Event::ConditionAdded,
                &[
                    ("field", condition.path().as_str()),
                    ("relation", condition.relation.token().as_str()),
                ],
            );
        }
        self.conditions.push(Expression::Comparison(condition));
        self
    }

    // ==================
    // Output
    // ==================

    /// Build the structured expression.
    ///
    /// - no conditions: the nested expression, or universal true
    /// - otherwise: conditions joined by the conjunction, then joined with
    ///   the nested expression (if any) by the same conjunction
    pub fn build(&self) -> Expression {
        if self.conditions.is_empty() {
            return self
                .nested
                .as_deref()
                .cloned()
                .unwrap_or(Expression::True);
        }

        let base = match self.conditions.as_slice() {
            [single] => single.clone(),
            _ => Expression::compound(self.conjunction, self.conditions.clone()),
        };
        match &self.nested {
            Some(nested) => {
                Expression::compound(self.conjunction, vec![base, nested.as_ref().clone()])
            }
            None => base,
        }
    }

    /// Render to the template and argument list handed to the engine
    pub fn render(&self) -> Format {
        self.build().render()
    }

    // ==================
    // Wrapping
    // ==================

    /// `NOT (<everything accumulated so far>)`
    pub fn wrap_into_negation(&self) -> PredicateBuilder {
        let mut builder = self.derived();
        builder.nested = Some(Arc::new(Expression::negate(self.build())));
        if Logger::enabled(Severity::Trace) {
            log_event(Event::NegationWrapped);
        }
        builder
    }

    /// `SUBQUERY(%K, $s, <this predicate>).@count <op> %d`
    ///
    /// Uses the configured variable (default `s`).
    pub fn wrap_into_subquery(
        &self,
        key: impl Into<String>,
        relation: Relation,
        count: i64,
    ) -> PredicateBuilder {
        let variable = self.subquery_variable.clone();
        self.subquery_with(variable, key.into(), relation, count)
    }

    /// Like [`wrap_into_subquery`](Self::wrap_into_subquery) with an explicit variable
    pub fn wrap_into_subquery_as(
        &self,
        variable: &str,
        key: impl Into<String>,
        relation: Relation,
        count: i64,
    ) -> PredicateResult<PredicateBuilder> {
        let variable = Variable::new(variable)?;
        Ok(self.subquery_with(variable, key.into(), relation, count))
    }

    fn subquery_with(
        &self,
        variable: Variable,
        source_field: String,
        relation: Relation,
        count: i64,
    ) -> PredicateBuilder {
        if Logger::enabled(Severity::Trace) {
            log_event_with_fields(
                Event::SubqueryWrapped,
                &[("source", source_field.as_str()), ("variable", variable.as_str())],
            );
        }

        let mut builder = self.derived();
        builder.conditions.push(Expression::Subquery(SubqueryExpression {
            source_field,
            variable,
            inner: Box::new(self.build()),
            count_relation: relation,
            count_threshold: count,
        }));
        builder
    }

    // ==================
    // Combination
    // ==================

    /// Join the fully built expressions of every builder with `conjunction`.
    ///
    /// Inputs are never mutated.
    pub fn combine<'a, I>(conjunction: Conjunction, builders: I) -> PredicateBuilder
    where
        I: IntoIterator<Item = &'a PredicateBuilder>,
    {
        let mut variable = None;
        let operands: Vec<Expression> = builders
            .into_iter()
            .map(|b| {
                variable.get_or_insert_with(|| b.subquery_variable.clone());
                b.build()
            })
            .collect();

        if Logger::enabled(Severity::Trace) {
            log_event_with_fields(
                Event::BuildersCombined,
                &[
                    ("conjunction", conjunction.keyword()),
                    ("operands", operands.len().to_string().as_str()),
                ],
            );
        }

        let mut builder = PredicateBuilder::new();
        if let Some(variable) = variable {
            builder.subquery_variable = variable;
        }
        builder.nested = Some(Arc::new(Expression::compound(conjunction, operands)));
        builder
    }

    /// Pairwise combination.
    ///
    /// When one side is empty the other side's state is shared as-is instead
    /// of adding a nesting level around it.
    pub fn combining(&self, conjunction: Conjunction, other: &PredicateBuilder) -> PredicateBuilder {
        if self.is_empty() {
            if Logger::enabled(Severity::Trace) {
                log_event_with_fields(Event::EmptySideElided, &[("side", "left")]);
            }
            return other.clone();
        }
        if other.is_empty() {
            if Logger::enabled(Severity::Trace) {
                log_event_with_fields(Event::EmptySideElided, &[("side", "right")]);
            }
            return self.clone();
        }
        Self::combine(conjunction, [self, other])
    }
}

fn string_value(value: impl Into<String>) -> TypedValue {
    TypedValue::Scalar(Value::String(value.into()))
}

/// `a + b` combines with AND
impl std::ops::Add for &PredicateBuilder {
    type Output = PredicateBuilder;

    fn add(self, rhs: &PredicateBuilder) -> PredicateBuilder {
        self.combining(Conjunction::And, rhs)
    }
}

impl std::ops::Add for PredicateBuilder {
    type Output = PredicateBuilder;

    fn add(self, rhs: PredicateBuilder) -> PredicateBuilder {
        self.combining(Conjunction::And, &rhs)
    }
}

/// `a | b` combines with OR
impl BitOr for &PredicateBuilder {
    type Output = PredicateBuilder;

    fn bitor(self, rhs: &PredicateBuilder) -> PredicateBuilder {
        self.combining(Conjunction::Or, rhs)
    }
}

impl BitOr for PredicateBuilder {
    type Output = PredicateBuilder;

    fn bitor(self, rhs: PredicateBuilder) -> PredicateBuilder {
        self.combining(Conjunction::Or, &rhs)
    }
}

impl fmt::Display for PredicateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.build(), f)
    }
}
