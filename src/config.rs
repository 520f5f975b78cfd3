//! Builder configuration
//!
//! Parsed from JSON; every field is optional and falls back to its default.
//!
//! ```json
//! { "conjunction": "or", "subquery_variable": "item" }
//! ```

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event};
use crate::predicate::{subquery, Conjunction, PredicateError, PredicateResult};

/// Defaults applied to builders created through [`crate::PredicateBuilder::with_config`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Connective joining a builder's own conditions (default: and)
    #[serde(default)]
    pub conjunction: Conjunction,

    /// Variable bound by `wrap_into_subquery` (default: "s")
    #[serde(default = "default_subquery_variable")]
    pub subquery_variable: String,
}

fn default_subquery_variable() -> String {
    subquery::DEFAULT_VARIABLE.to_string()
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            conjunction: Conjunction::default(),
            subquery_variable: default_subquery_variable(),
        }
    }
}

impl BuilderConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> PredicateResult<Self> {
        let config: BuilderConfig = match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(Event::ConfigRejected, &[("reason", reason.as_str())]);
                return Err(PredicateError::InvalidConfig(reason));
            }
        };

        if let Err(e) = config.validate() {
            log_event_with_fields(Event::ConfigRejected, &[("reason", e.to_string().as_str())]);
            return Err(e);
        }

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("conjunction", config.conjunction.keyword()),
                ("subquery_variable", config.subquery_variable.as_str()),
            ],
        );
        Ok(config)
    }

    /// Check field constraints
    pub fn validate(&self) -> PredicateResult<()> {
        subquery::validate_variable(&self.subquery_variable).map_err(|_| {
            PredicateError::InvalidConfig(format!(
                "subquery_variable '{}' is not an identifier",
                self.subquery_variable
            ))
        })
    }
}
