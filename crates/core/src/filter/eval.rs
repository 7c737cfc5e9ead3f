// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Evaluation of filters against field maps.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde_json::Value;

use super::expr::{Filter, Predicate};
use crate::record::{Fields, HasFields};

impl Filter {
    /// Returns true if the record satisfies this filter.
    pub fn matches<T: HasFields + ?Sized>(&self, record: &T) -> bool {
        evaluate(record.fields(), self)
    }
}

impl Predicate {
    /// Tests a single field value. Absent fields never match.
    pub fn test(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            Predicate::Equals(expected) => values_equal(value, expected),
            Predicate::Matches(re) => string_form(value).is_some_and(|s| re.is_match(&s)),
            Predicate::Between(low, high) => in_range(value, low, high),
        }
    }
}

/// Evaluates a filter against one field map.
pub fn evaluate(fields: &Fields, filter: &Filter) -> bool {
    match filter {
        Filter::And(subs) => subs.iter().all(|f| evaluate(fields, f)),
        Filter::Or(subs) => subs.iter().any(|f| evaluate(fields, f)),
        Filter::Not(inner) => !evaluate(fields, inner),
        Filter::Field { field, predicate } => predicate.test(fields.get(field)),
    }
}

/// Returns the records matching `filter`, in input order.
///
/// Works over index sets: `and` intersects, `or` unions and `not` takes the
/// complement against the full input.
pub fn apply<'a, T: HasFields>(records: &'a [T], filter: &Filter) -> Vec<&'a T> {
    let universe: BTreeSet<usize> = (0..records.len()).collect();
    matching(records, filter, &universe)
        .into_iter()
        .map(|i| &records[i])
        .collect()
}

fn matching<T: HasFields>(records: &[T], filter: &Filter, universe: &BTreeSet<usize>) -> BTreeSet<usize> {
    match filter {
        Filter::And(subs) => {
            let mut set = universe.clone();
            for sub in subs {
                if set.is_empty() {
                    break;
                }
                let hits = matching(records, sub, &set);
                set.retain(|i| hits.contains(i));
            }
            set
        }
        Filter::Or(subs) => {
            let mut set = BTreeSet::new();
            for sub in subs {
                set.extend(matching(records, sub, universe));
            }
            set
        }
        Filter::Not(inner) => {
            let hits = matching(records, inner, universe);
            universe.difference(&hits).copied().collect()
        }
        Filter::Field { field, predicate } => universe
            .iter()
            .copied()
            .filter(|&i| predicate.test(records[i].fields().get(field)))
            .collect(),
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => actual == expected,
    }
}

fn in_range(value: &Value, low: &Value, high: &Value) -> bool {
    match (order(low, value), order(value, high)) {
        (Some(lo), Some(hi)) => lo != Ordering::Greater && hi != Ordering::Greater,
        _ => false,
    }
}

/// Orders two numbers or two strings. Any other pairing is incomparable.
fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn string_form(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
