// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Filter expression types.

use regex::Regex;
use serde_json::{json, Map, Value};

/// A filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every sub-filter must match. `And(vec![])` matches everything.
    And(Vec<Filter>),
    /// At least one sub-filter must match. `Or(vec![])` matches nothing.
    Or(Vec<Filter>),
    /// The sub-filter must not match.
    Not(Box<Filter>),
    /// A predicate on one field.
    Field { field: String, predicate: Predicate },
}

/// Leaf predicates.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Field equals the literal (numbers compare numerically).
    Equals(Value),
    /// Field's string form matches the pattern.
    Matches(Regex),
    /// Field lies in `[low, high]`, bounds included.
    Between(Value, Value),
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Predicate::Equals(a), Predicate::Equals(b)) => a == b,
            (Predicate::Matches(a), Predicate::Matches(b)) => a.as_str() == b.as_str(),
            (Predicate::Between(a1, a2), Predicate::Between(b1, b2)) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

impl Filter {
    /// The empty filter, matching every record.
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Field { field: field.into(), predicate: Predicate::Equals(value.into()) }
    }

    pub fn regex(field: impl Into<String>, pattern: Regex) -> Self {
        Filter::Field { field: field.into(), predicate: Predicate::Matches(pattern) }
    }

    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Filter::Field {
            field: field.into(),
            predicate: Predicate::Between(low.into(), high.into()),
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Returns true for the empty filter.
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::And(subs) if subs.is_empty())
    }

    /// Converts the filter back to its JSON form.
    ///
    /// Used to pass the filter to the server as a best-effort hint.
    pub fn to_json(&self) -> Value {
        match self {
            Filter::And(subs) if subs.is_empty() => Value::Object(Map::new()),
            Filter::And(subs) => json!({ "and": subs.iter().map(Filter::to_json).collect::<Vec<_>>() }),
            Filter::Or(subs) => json!({ "or": subs.iter().map(Filter::to_json).collect::<Vec<_>>() }),
            Filter::Not(inner) => json!({ "not": inner.to_json() }),
            Filter::Field { field, predicate } => {
                let value = match predicate {
                    Predicate::Equals(v) => v.clone(),
                    Predicate::Matches(re) => json!({ "$regex": re.as_str() }),
                    Predicate::Between(low, high) => json!([low, high]),
                };
                let mut map = Map::new();
                map.insert(field.clone(), value);
                Value::Object(map)
            }
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::all()
    }
}

#[cfg(test)]
#[path = "expr_tests.rs"]
mod tests;
