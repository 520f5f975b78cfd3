//! Reference evaluator for integration tests
//!
//! Evaluates an `Expression` against a JSON document so logical properties
//! can be checked by comparing satisfying documents instead of text.
//! Diacritic-insensitive matching is not modelled; fixtures are ASCII.

#![allow(dead_code)]

use predicate_builder::predicate::{
    Aggregation, Condition, Conjunction, Expression, Relation, RelationKind, StringOperator,
    StringRelation, TypedValue,
};
use regex::Regex;
use serde_json::Value;

/// Evaluate `expr` with `doc` as the current object
pub fn eval(expr: &Expression, doc: &Value) -> bool {
    match expr {
        Expression::True => true,
        Expression::Comparison(condition) => eval_condition(condition, doc),
        Expression::Compound {
            conjunction,
            operands,
        } => match conjunction {
            Conjunction::And => operands.iter().all(|op| eval(op, doc)),
            Conjunction::Or => operands.iter().any(|op| eval(op, doc)),
        },
        Expression::Not(inner) => !eval(inner, doc),
        Expression::Subquery(subquery) => {
            let count = doc
                .get(&subquery.source_field)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter(|item| eval(&subquery.inner, item)).count())
                .unwrap_or(0) as i64;
            compare_numbers(count as f64, subquery.count_relation, subquery.count_threshold as f64)
        }
        Expression::Raw(_) => panic!("raw fragments are opaque to the reference evaluator"),
    }
}

fn eval_condition(condition: &Condition, doc: &Value) -> bool {
    let target = doc.get(&condition.field);

    match condition.aggregation {
        None => {
            let actual = match &condition.sub_field {
                Some(sub) => target.and_then(|t| t.get(sub)),
                None => target,
            };
            test_value(actual, &condition.relation, &condition.value)
        }
        Some(aggregation) => {
            let items = target.and_then(Value::as_array).cloned().unwrap_or_default();
            let mut results = items.iter().map(|item| {
                let actual = match &condition.sub_field {
                    Some(sub) => item.get(sub),
                    None => Some(item),
                };
                test_value(actual, &condition.relation, &condition.value)
            });
            match aggregation {
                Aggregation::Any | Aggregation::Some => results.any(|r| r),
                Aggregation::All => results.all(|r| r),
                Aggregation::None => !results.any(|r| r),
            }
        }
    }
}

fn test_value(actual: Option<&Value>, relation: &RelationKind, expected: &TypedValue) -> bool {
    match relation {
        RelationKind::Comparison(relation) => compare(actual, *relation, expected),
        RelationKind::String(relation) => match (actual.and_then(Value::as_str), expected) {
            (Some(text), TypedValue::Scalar(Value::String(pattern))) => {
                string_match(text, relation, pattern)
            }
            _ => false,
        },
    }
}

/// Booleans compare as the numbers 1 and 0
fn normalize(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(u8::from(*b)),
        other => other.clone(),
    }
}

fn compare(actual: Option<&Value>, relation: Relation, expected: &TypedValue) -> bool {
    let actual = actual.filter(|v| !v.is_null()).map(normalize);

    let expected = match expected {
        TypedValue::Null => {
            return match relation {
                Relation::Equal => actual.is_none(),
                Relation::NotEqual => actual.is_some(),
                _ => false,
            }
        }
        TypedValue::Collection(items) => {
            return relation == Relation::In
                && actual.map_or(false, |a| items.iter().map(normalize).any(|i| values_equal(&a, &i)));
        }
        TypedValue::Integer64(i) => Value::from(*i),
        TypedValue::Boolean(b) => Value::from(u8::from(*b)),
        TypedValue::Scalar(v) => normalize(v),
    };

    let Some(actual) = actual else {
        return relation == Relation::NotEqual;
    };

    match (&actual, &expected) {
        (Value::Number(a), Value::Number(b)) => {
            compare_numbers(a.as_f64().unwrap_or(0.0), relation, b.as_f64().unwrap_or(0.0))
        }
        (Value::String(a), Value::String(b)) => match relation {
            Relation::Equal => a == b,
            Relation::NotEqual => a != b,
            Relation::Less => a < b,
            Relation::Greater => a > b,
            Relation::LessOrEqual => a <= b,
            Relation::GreaterOrEqual => a >= b,
            Relation::In => false,
        },
        _ => match relation {
            Relation::Equal => actual == expected,
            Relation::NotEqual => actual != expected,
            _ => false,
        },
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_numbers(a: f64, relation: Relation, b: f64) -> bool {
    match relation {
        Relation::Equal => a == b,
        Relation::NotEqual => a != b,
        Relation::Less => a < b,
        Relation::Greater => a > b,
        Relation::LessOrEqual => a <= b,
        Relation::GreaterOrEqual => a >= b,
        Relation::In => false,
    }
}

fn string_match(text: &str, relation: &StringRelation, pattern: &str) -> bool {
    let (text, pattern) = if relation.case_insensitive {
        (text.to_lowercase(), pattern.to_lowercase())
    } else {
        (text.to_string(), pattern.to_string())
    };

    match relation.operator {
        StringOperator::Contains => text.contains(&pattern),
        StringOperator::BeginsWith => text.starts_with(&pattern),
        StringOperator::EndsWith => text.ends_with(&pattern),
        StringOperator::Like => {
            let translated = regex::escape(&pattern).replace(r"\*", ".*").replace(r"\?", ".");
            full_match(&text, &translated)
        }
        StringOperator::Matches => full_match(&text, &pattern),
    }
}

fn full_match(text: &str, pattern: &str) -> bool {
    Regex::new(&format!("^(?:{})$", pattern))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Documents satisfying `expr`, by index into `docs`
pub fn satisfying(expr: &Expression, docs: &[Value]) -> Vec<usize> {
    docs.iter()
        .enumerate()
        .filter(|(_, doc)| eval(expr, doc))
        .map(|(i, _)| i)
        .collect()
}
