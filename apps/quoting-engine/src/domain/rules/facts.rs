//! Per-evaluation fact set.

use std::collections::HashMap;

use serde_json::Value;

use super::path::FactPath;

static UNDEFINED: Value = Value::Null;

/// Named facts supplied fresh to each evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facts {
    values: HashMap<String, Value>,
}

impl Facts {
    /// Create an empty fact set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a fact.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Fact value, `null` when the fact is unknown.
    #[must_use]
    pub fn get(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&UNDEFINED)
    }

    /// Value at `path` inside a fact.
    #[must_use]
    pub fn value_at(&self, name: &str, path: &FactPath) -> Value {
        path.select(self.get(name))
    }
}
