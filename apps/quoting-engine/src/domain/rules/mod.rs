//! Business Rules
//!
//! Fact-based rules evaluated against each quote request. A rule is a
//! condition tree plus the event it emits when the tree holds. Rules are
//! validated into typed trees when loaded and never change afterwards.
//!
//! Rule file format:
//!
//! ```json
//! [
//!   {
//!     "name": "payee-currency",
//!     "conditions": {
//!       "all": [
//!         {"fact": "payload", "path": "$.amount.currency", "operator": "notIn", "value": ["USD"]}
//!       ]
//!     },
//!     "event": {"type": "INVALID_QUOTE_REQUEST", "params": {"FSPIOPError": "PAYEE_UNSUPPORTED_CURRENCY"}}
//!   }
//! ]
//! ```

mod condition;
mod event;
mod facts;
mod operator;
mod path;

use serde_json::Value;
use thiserror::Error;

pub use condition::{Condition, ConditionValue, LeafCondition};
pub use event::{EventType, RuleEvent};
pub use facts::Facts;
pub use operator::Operator;
pub use path::{FactPath, PathSegment};

/// Errors raised while loading rules.
#[derive(Debug, Error)]
pub enum RuleLoadError {
    /// Rules file could not be read.
    #[error("Failed to read rules file '{path}': {source}")]
    Io {
        /// Path to the rules file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Rules are not valid JSON.
    #[error("Rules are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top level is not an array.
    #[error("Rules must be a JSON array")]
    NotAnArray,

    /// A rule failed validation.
    #[error("Rule {index}: {source}")]
    InvalidRule {
        /// Position in the rule list.
        index: usize,
        /// Cause.
        source: Box<RuleLoadError>,
    },

    /// Operator name not in the registry.
    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    /// Path expression could not be parsed.
    #[error("Invalid path '{path}': {message}")]
    InvalidPath {
        /// The path.
        path: String,
        /// What is wrong with it.
        message: String,
    },

    /// Condition is structurally invalid.
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),
}

/// A validated rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Optional name, used in logs.
    pub name: Option<String>,
    /// Condition tree.
    pub conditions: Condition,
    /// Event emitted when the conditions hold.
    pub event: RuleEvent,
}

impl Rule {
    /// Validate one rule from its JSON form.
    pub fn from_value(value: &Value) -> Result<Self, RuleLoadError> {
        let object = value.as_object().ok_or_else(|| {
            RuleLoadError::InvalidCondition("rule must be an object".to_string())
        })?;
        let conditions = object
            .get("conditions")
            .ok_or_else(|| RuleLoadError::InvalidCondition("rule has no conditions".to_string()))
            .and_then(Condition::parse)?;
        let event = object
            .get("event")
            .ok_or_else(|| RuleLoadError::InvalidCondition("rule has no event".to_string()))
            .and_then(RuleEvent::deserialize_from)?;
        let name = object.get("name").and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            name,
            conditions,
            event,
        })
    }
}

impl RuleEvent {
    fn deserialize_from(value: &Value) -> Result<Self, RuleLoadError> {
        <Self as serde::Deserialize>::deserialize(value).map_err(RuleLoadError::Json)
    }
}

/// Parse and validate a JSON array of rules.
pub fn parse_rules(json: &str) -> Result<Vec<Rule>, RuleLoadError> {
    let value: Value = serde_json::from_str(json)?;
    let items = value.as_array().ok_or(RuleLoadError::NotAnArray)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Rule::from_value(item).map_err(|source| RuleLoadError::InvalidRule {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

/// Evaluate rules in list order, returning the events of every rule that
/// fires. Pure: the result depends only on the arguments.
#[must_use]
pub fn evaluate(rules: &[Rule], facts: &Facts) -> Vec<RuleEvent> {
    rules
        .iter()
        .filter(|rule| rule.conditions.evaluate(facts))
        .map(|rule| rule.event.clone())
        .collect()
}
