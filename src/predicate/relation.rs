//! Relation vocabulary
//!
//! Closed sets of operators understood by the consuming engine. Every
//! relation maps to exactly one operator token; nothing here holds state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison relations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
    /// `IN` (membership in a collection argument)
    In,
}

impl Relation {
    /// All comparison relations in declaration order
    pub const ALL: [Relation; 7] = [
        Relation::Equal,
        Relation::NotEqual,
        Relation::Less,
        Relation::Greater,
        Relation::LessOrEqual,
        Relation::GreaterOrEqual,
        Relation::In,
    ];

    /// Returns the operator token
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Equal => "==",
            Relation::NotEqual => "!=",
            Relation::Less => "<",
            Relation::Greater => ">",
            Relation::LessOrEqual => "<=",
            Relation::GreaterOrEqual => ">=",
            Relation::In => "IN",
        }
    }
}

impl Default for Relation {
    fn default() -> Self {
        Relation::Equal
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String matching operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringOperator {
    Contains,
    Like,
    BeginsWith,
    EndsWith,
    Matches,
}

impl StringOperator {
    pub const ALL: [StringOperator; 5] = [
        StringOperator::Contains,
        StringOperator::Like,
        StringOperator::BeginsWith,
        StringOperator::EndsWith,
        StringOperator::Matches,
    ];

    /// Returns the bare operator keyword (no modifier suffix)
    pub fn as_str(&self) -> &'static str {
        match self {
            StringOperator::Contains => "CONTAINS",
            StringOperator::Like => "LIKE",
            StringOperator::BeginsWith => "BEGINSWITH",
            StringOperator::EndsWith => "ENDSWITH",
            StringOperator::Matches => "MATCHES",
        }
    }
}

/// A string relation with its comparison modifiers
///
/// - case insensitive: `[c]`, upper and lower case compare equal
/// - diacritic insensitive: `[d]`, `ё` compares equal to `е`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringRelation {
    pub operator: StringOperator,
    pub case_insensitive: bool,
    pub diacritic_insensitive: bool,
}

impl StringRelation {
    /// Create a string relation with explicit modifiers
    pub fn new(operator: StringOperator, case_insensitive: bool, diacritic_insensitive: bool) -> Self {
        Self {
            operator,
            case_insensitive,
            diacritic_insensitive,
        }
    }

    /// `CONTAINS`
    pub fn contains(case_insensitive: bool, diacritic_insensitive: bool) -> Self {
        Self::new(StringOperator::Contains, case_insensitive, diacritic_insensitive)
    }

    /// `LIKE` (`?` and `*` wildcards)
    pub fn like(case_insensitive: bool, diacritic_insensitive: bool) -> Self {
        Self::new(StringOperator::Like, case_insensitive, diacritic_insensitive)
    }

    /// `BEGINSWITH`
    pub fn begins_with(case_insensitive: bool, diacritic_insensitive: bool) -> Self {
        Self::new(StringOperator::BeginsWith, case_insensitive, diacritic_insensitive)
    }

    /// `ENDSWITH`
    pub fn ends_with(case_insensitive: bool, diacritic_insensitive: bool) -> Self {
        Self::new(StringOperator::EndsWith, case_insensitive, diacritic_insensitive)
    }

    /// `MATCHES` (regular expression)
    pub fn matches(case_insensitive: bool, diacritic_insensitive: bool) -> Self {
        Self::new(StringOperator::Matches, case_insensitive, diacritic_insensitive)
    }

    /// Returns the bracketed modifier code: "", "[c]", "[d]" or "[cd]"
    pub fn modifier(&self) -> &'static str {
        match (self.case_insensitive, self.diacritic_insensitive) {
            (false, false) => "",
            (true, false) => "[c]",
            (false, true) => "[d]",
            (true, true) => "[cd]",
        }
    }

    /// Returns the full operator token, e.g. `LIKE[cd]`
    pub fn token(&self) -> String {
        format!("{}{}", self.operator.as_str(), self.modifier())
    }
}

impl fmt::Display for StringRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator.as_str(), self.modifier())
    }
}

/// Any relation a condition can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Comparison(Relation),
    String(StringRelation),
}

impl RelationKind {
    /// Returns the operator token
    pub fn token(&self) -> String {
        match self {
            RelationKind::Comparison(relation) => relation.as_str().to_string(),
            RelationKind::String(relation) => relation.token(),
        }
    }
}

impl From<Relation> for RelationKind {
    fn from(relation: Relation) -> Self {
        RelationKind::Comparison(relation)
    }
}

impl From<StringRelation> for RelationKind {
    fn from(relation: StringRelation) -> Self {
        RelationKind::String(relation)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Comparison(relation) => fmt::Display::fmt(relation, f),
            RelationKind::String(relation) => fmt::Display::fmt(relation, f),
        }
    }
}

/// Quantifiers applied over a to-many relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    Any,
    Some,
    All,
    None,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Any => "ANY",
            Aggregation::Some => "SOME",
            Aggregation::All => "ALL",
            Aggregation::None => "NONE",
        }
    }
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Any
    }
}

/// Logical connective joining the operands of a compound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn keyword(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

impl Default for Conjunction {
    fn default() -> Self {
        Conjunction::And
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_tokens() {
        let tokens: Vec<&str> = Relation::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(tokens, vec!["==", "!=", "<", ">", "<=", ">=", "IN"]);
    }

    #[test]
    fn test_string_relation_tokens_exhaustive() {
        let keywords = ["CONTAINS", "LIKE", "BEGINSWITH", "ENDSWITH", "MATCHES"];
        let modifiers = [
            (false, false, ""),
            (true, false, "[c]"),
            (false, true, "[d]"),
            (true, true, "[cd]"),
        ];

        let mut seen = std::collections::HashSet::new();
        for (operator, keyword) in StringOperator::ALL.iter().zip(keywords) {
            for (c, d, suffix) in modifiers {
                let relation = StringRelation::new(*operator, c, d);
                let expected = format!("{}{}", keyword, suffix);
                assert_eq!(relation.token(), expected);
                assert_eq!(relation.to_string(), expected);
                seen.insert(relation.token());
            }
        }
        assert_eq!(seen.len(), 20);
    }

    #[test]
    fn test_string_relation_constructors() {
        assert_eq!(StringRelation::like(true, true).token(), "LIKE[cd]");
        assert_eq!(StringRelation::contains(true, false).token(), "CONTAINS[c]");
        assert_eq!(StringRelation::begins_with(false, true).token(), "BEGINSWITH[d]");
        assert_eq!(StringRelation::ends_with(false, false).token(), "ENDSWITH");
        assert_eq!(StringRelation::matches(true, true).token(), "MATCHES[cd]");
    }

    #[test]
    fn test_relation_kind_token() {
        assert_eq!(RelationKind::from(Relation::In).token(), "IN");
        assert_eq!(
            RelationKind::from(StringRelation::like(false, true)).token(),
            "LIKE[d]"
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Relation::default(), Relation::Equal);
        assert_eq!(Aggregation::default(), Aggregation::Any);
        assert_eq!(Conjunction::default(), Conjunction::And);
    }

    #[test]
    fn test_aggregation_keywords() {
        let keywords: Vec<&str> = [
            Aggregation::Any,
            Aggregation::Some,
            Aggregation::All,
            Aggregation::None,
        ]
        .iter()
        .map(|a| a.as_str())
        .collect();
        assert_eq!(keywords, vec!["ANY", "SOME", "ALL", "NONE"]);
    }
}
