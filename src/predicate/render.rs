//! Expression rendering
//!
//! Walks an [`Expression`] once, writing the template and the argument list
//! side by side so every placeholder is pushed together with its argument.
//!
//! Inside a subquery the bound variable is threaded through the walk and
//! written in front of each field placeholder (`$s.%K`). Structured nodes
//! never go through text rewriting; only raw fragments do.

use crate::observability::{log_event_with_fields, Event, Logger, Severity};

use super::ast::{Condition, Expression, RawFragment, SubqueryExpression};
use super::format::{escape_template_text, Argument, Format, FALSE_PREDICATE, TRUE_PREDICATE};
use super::relation::Conjunction;
use super::subquery::rewrite_field_references;

pub(crate) struct Renderer {
    out: Format,
}

impl Renderer {
    pub(crate) fn new() -> Self {
        Self {
            out: Format::default(),
        }
    }

    pub(crate) fn push(&mut self, expr: &Expression) {
        self.expression(expr, None, false);
    }

    pub(crate) fn push_scoped(&mut self, expr: &Expression, variable: &str) {
        self.expression(expr, Some(variable), false);
    }

    /// Placeholders and arguments are pushed together and raw fragments and
    /// variables are validated on construction, so a misaligned result is an
    /// internal bug and panics in every build profile.
    pub(crate) fn finish(self) -> Format {
        assert!(
            self.out.check_alignment().is_ok(),
            "rendered format is misaligned: {:?}",
            self.out
        );
        self.out
    }

    /// `grouped` is set when the expression is an operand of a larger one
    fn expression(&mut self, expr: &Expression, scope: Option<&str>, grouped: bool) {
        match expr {
            Expression::True => self.out.push_str(TRUE_PREDICATE),
            Expression::Comparison(condition) => self.condition(condition, scope),
            Expression::Compound {
                conjunction,
                operands,
            } => self.compound(*conjunction, operands, scope, grouped),
            Expression::Not(inner) => {
                self.out.push_str("NOT (");
                self.expression(inner, scope, false);
                self.out.push_str(")");
            }
            Expression::Subquery(subquery) => self.subquery(subquery, scope),
            Expression::Raw(fragment) => self.raw(fragment, scope, grouped),
        }
    }

    fn compound(
        &mut self,
        conjunction: Conjunction,
        operands: &[Expression],
        scope: Option<&str>,
        grouped: bool,
    ) {
        match operands {
            [] => self.out.push_str(match conjunction {
                Conjunction::And => TRUE_PREDICATE,
                Conjunction::Or => FALSE_PREDICATE,
            }),
            [single] => self.expression(single, scope, grouped),
            _ => {
                if grouped {
                    self.out.push_str("(");
                }
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(" ");
                        self.out.push_str(conjunction.keyword());
                        self.out.push_str(" ");
                    }
                    self.expression(operand, scope, true);
                }
                if grouped {
                    self.out.push_str(")");
                }
            }
        }
    }

    /// `[AGG ][$var.]%K[.%K] OP value`
    fn condition(&mut self, condition: &Condition, scope: Option<&str>) {
        if let Some(aggregation) = condition.aggregation {
            self.out.push_str(aggregation.as_str());
            self.out.push_str(" ");
        }

        self.key_path(&condition.field, condition.sub_field.as_deref(), scope);

        self.out.push_str(" ");
        self.out.push_str(&condition.relation.token());
        self.out.push_str(" ");

        let value = condition.value.format();
        match value.argument {
            Some(argument) => self.out.push_argument(argument),
            None => self.out.push_str(value.token),
        }
    }

    fn key_path(&mut self, field: &str, sub_field: Option<&str>, scope: Option<&str>) {
        if let Some(variable) = scope {
            self.out.push_str("$");
            self.out.push_str(variable);
            self.out.push_str(".");
        }
        self.out.push_argument(Argument::Key(field.to_string()));
        if let Some(sub) = sub_field {
            self.out.push_str(".");
            self.out.push_argument(Argument::Key(sub.to_string()));
        }
    }

    /// `SUBQUERY([$outer.]%K, $var, <inner>).@count OP %d`
    fn subquery(&mut self, subquery: &SubqueryExpression, scope: Option<&str>) {
        self.out.push_str("SUBQUERY(");
        self.key_path(&subquery.source_field, None, scope);
        self.out.push_str(", $");
        self.out.push_str(subquery.variable.as_str());
        self.out.push_str(", ");
        // Inner fields belong to the element, not to the outer scope
        self.expression(&subquery.inner, Some(subquery.variable.as_str()), false);
        self.out.push_str(").@count ");
        self.out.push_str(subquery.count_relation.as_str());
        self.out.push_str(" ");
        self.out.push_argument(Argument::Int(subquery.count_threshold));
    }

    fn raw(&mut self, fragment: &RawFragment, scope: Option<&str>, grouped: bool) {
        if grouped {
            self.out.push_str("(");
        }
        match scope {
            None => self.out.append(fragment.format()),
            Some(variable) => {
                let scoped = rewrite_field_references(fragment.text(), variable);
                if Logger::enabled(Severity::Trace) {
                    log_event_with_fields(
                        Event::RawFragmentRewritten,
                        &[("variable", variable), ("text", scoped.as_str())],
                    );
                }
                self.out.push_str(&escape_template_text(&scoped));
            }
        }
        if grouped {
            self.out.push_str(")");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::relation::Relation;
    use crate::predicate::subquery::Variable;
    use serde_json::json;

    fn cond(field: &str, relation: Relation, value: i64) -> Expression {
        Expression::from(Condition::new(field, relation, value))
    }

    #[test]
    fn test_compound_joins_with_keyword() {
        let expr = Expression::compound(
            Conjunction::Or,
            vec![cond("a", Relation::Equal, 1), cond("b", Relation::Less, 2)],
        );
        let format = expr.render();
        assert_eq!(format.template(), "%K == %lld OR %K < %lld");
        assert_eq!(format.arguments().len(), 4);
    }

    #[test]
    fn test_single_operand_compound_is_flat() {
        let expr = Expression::compound(Conjunction::And, vec![cond("a", Relation::Equal, 1)]);
        assert_eq!(expr.to_string(), "a == 1");
    }

    #[test]
    fn test_empty_compounds() {
        assert_eq!(
            Expression::compound(Conjunction::And, vec![]).to_string(),
            "TRUEPREDICATE"
        );
        assert_eq!(
            Expression::compound(Conjunction::Or, vec![]).to_string(),
            "FALSEPREDICATE"
        );
    }

    #[test]
    fn test_nested_compound_is_grouped() {
        let inner = Expression::compound(
            Conjunction::Or,
            vec![cond("a", Relation::Equal, 1), cond("b", Relation::Equal, 2)],
        );
        let expr = Expression::compound(Conjunction::And, vec![inner, cond("c", Relation::Equal, 3)]);
        assert_eq!(expr.to_string(), "(a == 1 OR b == 2) AND c == 3");
    }

    #[test]
    fn test_not_groups_operand() {
        let expr = Expression::negate(cond("a", Relation::Greater, 1));
        assert_eq!(expr.render().template(), "NOT (%K > %lld)");
        assert_eq!(expr.to_string(), "NOT (a > 1)");
    }

    #[test]
    fn test_scoped_condition() {
        let mut renderer = Renderer::new();
        renderer.push_scoped(&cond("price", Relation::Greater, 100), "s");
        let format = renderer.finish();
        assert_eq!(format.template(), "$s.%K > %lld");
        assert_eq!(format.describe().unwrap(), "$s.price > 100");
    }

    #[test]
    fn test_nested_subquery_scoping() {
        let inner = SubqueryExpression {
            source_field: "lines".into(),
            variable: Variable::new("l").unwrap(),
            inner: Box::new(cond("qty", Relation::Greater, 5)),
            count_relation: Relation::Greater,
            count_threshold: 0,
        };
        let outer = SubqueryExpression {
            source_field: "orders".into(),
            variable: Variable::default(),
            inner: Box::new(Expression::Subquery(inner)),
            count_relation: Relation::GreaterOrEqual,
            count_threshold: 2,
        };
        assert_eq!(
            Expression::Subquery(outer).to_string(),
            "SUBQUERY(orders, $s, SUBQUERY($s.lines, $l, $l.qty > 5).@count > 0).@count >= 2"
        );
    }

    #[test]
    fn test_raw_fragment_scoped_by_rewrite() {
        let fragment = RawFragment::new(Format::new(
            "%K == %@",
            vec![Argument::Key("code".into()), Argument::Object(json!("100%"))],
        ))
        .unwrap();
        let mut renderer = Renderer::new();
        renderer.push_scoped(&Expression::Raw(fragment), "s");
        let format = renderer.finish();
        assert!(format.arguments().is_empty());
        assert_eq!(format.template(), "$s.code == \"100%%\"");
        assert_eq!(format.describe().unwrap(), "$s.code == \"100%\"");
    }
}
