//! Observable builder events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Construction
    /// Condition appended to a builder
    ConditionAdded,
    /// Raw fragment appended to a builder
    RawFragmentAdded,

    // Wrapping
    /// Builder wrapped into NOT(...)
    NegationWrapped,
    /// Builder wrapped into SUBQUERY(...)
    SubqueryWrapped,
    /// Raw fragment scoped by lexical rewrite
    RawFragmentRewritten,

    // Combination
    /// Builders merged into a compound
    BuildersCombined,
    /// Combination short-circuited on an empty side
    EmptySideElided,

    // Configuration
    /// Builder configuration parsed
    ConfigLoaded,
    /// Builder configuration rejected
    ConfigRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConditionAdded => "CONDITION_ADDED",
            Event::RawFragmentAdded => "RAW_FRAGMENT_ADDED",
            Event::NegationWrapped => "NEGATION_WRAPPED",
            Event::SubqueryWrapped => "SUBQUERY_WRAPPED",
            Event::RawFragmentRewritten => "RAW_FRAGMENT_REWRITTEN",
            Event::BuildersCombined => "BUILDERS_COMBINED",
            Event::EmptySideElided => "EMPTY_SIDE_ELIDED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigRejected => "CONFIG_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded => Severity::Info,
            Event::ConfigRejected => Severity::Warn,
            _ => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
