//! Condition tree.

use serde_json::{Map, Value};

use super::RuleLoadError;
use super::facts::Facts;
use super::operator::Operator;
use super::path::FactPath;

/// Right-hand side of a leaf condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// Literal JSON value.
    Literal(Value),
    /// Another fact, optionally narrowed by a path.
    Fact {
        /// Fact name.
        fact: String,
        /// Path inside the fact.
        path: FactPath,
    },
}

impl ConditionValue {
    fn resolve(&self, facts: &Facts) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Fact { fact, path } => facts.value_at(fact, path),
        }
    }
}

/// `{fact, path?, operator, value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafCondition {
    /// Fact name.
    pub fact: String,
    /// Path inside the fact.
    pub path: FactPath,
    /// Operator.
    pub operator: Operator,
    /// Comparison value.
    pub value: ConditionValue,
}

/// Boolean expression over facts.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Every child holds; stops at the first failure.
    All(Vec<Condition>),
    /// Some child holds; stops at the first success.
    Any(Vec<Condition>),
    /// Child does not hold.
    Not(Box<Condition>),
    /// Single comparison.
    Leaf(LeafCondition),
}

impl Condition {
    /// Build a condition tree from its JSON form.
    pub fn parse(value: &Value) -> Result<Self, RuleLoadError> {
        let Some(object) = value.as_object() else {
            return Err(RuleLoadError::InvalidCondition(
                "condition must be an object".to_string(),
            ));
        };

        if let Some(children) = object.get("all") {
            return Ok(Self::All(parse_children("all", children)?));
        }
        if let Some(children) = object.get("any") {
            return Ok(Self::Any(parse_children("any", children)?));
        }
        if let Some(child) = object.get("not") {
            return Ok(Self::Not(Box::new(Self::parse(child)?)));
        }
        if object.contains_key("fact") {
            return parse_leaf(object).map(Self::Leaf);
        }

        Err(RuleLoadError::InvalidCondition(
            "expected one of 'all', 'any', 'not' or 'fact'".to_string(),
        ))
    }

    /// Evaluate against a fact set.
    #[must_use]
    pub fn evaluate(&self, facts: &Facts) -> bool {
        match self {
            Self::All(children) => children.iter().all(|c| c.evaluate(facts)),
            Self::Any(children) => children.iter().any(|c| c.evaluate(facts)),
            Self::Not(child) => !child.evaluate(facts),
            Self::Leaf(leaf) => {
                let fact_value = facts.value_at(&leaf.fact, &leaf.path);
                let rule_value = leaf.value.resolve(facts);
                leaf.operator.apply(&fact_value, &rule_value)
            }
        }
    }
}

fn parse_children(kind: &str, value: &Value) -> Result<Vec<Condition>, RuleLoadError> {
    value
        .as_array()
        .ok_or_else(|| RuleLoadError::InvalidCondition(format!("'{kind}' must be an array")))?
        .iter()
        .map(Condition::parse)
        .collect()
}

fn parse_leaf(object: &Map<String, Value>) -> Result<LeafCondition, RuleLoadError> {
    let fact = string_field(object, "fact")?
        .ok_or_else(|| RuleLoadError::InvalidCondition("'fact' must be a string".to_string()))?;
    let operator = string_field(object, "operator")?
        .ok_or_else(|| RuleLoadError::InvalidCondition(format!("fact '{fact}' has no operator")))?
        .parse::<Operator>()?;
    let path = parse_path(object)?;

    let value = match object.get("value") {
        Some(Value::Object(reference)) if reference.get("fact").is_some_and(Value::is_string) => {
            ConditionValue::Fact {
                fact: string_field(reference, "fact")?.unwrap_or_default(),
                path: parse_path(reference)?,
            }
        }
        Some(literal) => ConditionValue::Literal(literal.clone()),
        None => ConditionValue::Literal(Value::Null),
    };

    Ok(LeafCondition {
        fact,
        path,
        operator,
        value,
    })
}

fn parse_path(object: &Map<String, Value>) -> Result<FactPath, RuleLoadError> {
    match string_field(object, "path")? {
        Some(path) => FactPath::parse(&path),
        None => Ok(FactPath::root()),
    }
}

fn string_field(object: &Map<String, Value>, name: &str) -> Result<Option<String>, RuleLoadError> {
    match object.get(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RuleLoadError::InvalidCondition(format!(
            "'{name}' must be a string"
        ))),
    }
}
