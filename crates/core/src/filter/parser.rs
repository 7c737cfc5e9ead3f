// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing filters from their JSON form.

use regex::Regex;
use serde_json::{Map, Value};

use super::expr::{Filter, Predicate};
use crate::error::{Error, Result};

const AND: &str = "and";
const OR: &str = "or";
const NOT: &str = "not";
const REGEX: &str = "$regex";
const OPTIONS: &str = "$options";

/// Parses a filter from JSON text.
///
/// # Errors
///
/// Returns [`Error::Json`] for malformed JSON, [`Error::InvalidFilter`] for
/// JSON that is not a filter, and [`Error::InvalidPattern`] for a bad regex.
pub fn parse_filter(input: &str) -> Result<Filter> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Filter::all());
    }
    let value: Value = serde_json::from_str(trimmed)?;
    Filter::from_json(&value)
}

impl Filter {
    /// Builds a filter from its JSON form.
    pub fn from_json(value: &Value) -> Result<Filter> {
        let map = value.as_object().ok_or_else(|| {
            Error::InvalidFilter(format!("expected an object, got {}", type_name(value)))
        })?;
        parse_object(map)
    }
}

fn parse_object(map: &Map<String, Value>) -> Result<Filter> {
    let mut nodes = map
        .iter()
        .map(|(key, value)| parse_entry(key, value))
        .collect::<Result<Vec<_>>>()?;

    if nodes.len() == 1 {
        if let Some(node) = nodes.pop() {
            return Ok(node);
        }
    }
    Ok(Filter::And(nodes))
}

fn parse_entry(key: &str, value: &Value) -> Result<Filter> {
    match key {
        AND => Ok(Filter::And(parse_group(key, value)?)),
        OR => Ok(Filter::Or(parse_group(key, value)?)),
        NOT => Ok(Filter::Not(Box::new(Filter::from_json(value).map_err(|e| match e {
            Error::InvalidFilter(reason) => Error::InvalidFilter(format!("'not': {reason}")),
            other => other,
        })?))),
        field => Ok(Filter::Field {
            field: field.to_string(),
            predicate: parse_predicate(field, value)?,
        }),
    }
}

/// Sub-filters of `and`/`or`: an array of filter objects, or an object whose
/// entries are each one sub-filter.
fn parse_group(key: &str, value: &Value) -> Result<Vec<Filter>> {
    match value {
        Value::Array(items) => items.iter().map(Filter::from_json).collect(),
        Value::Object(map) => map.iter().map(|(k, v)| parse_entry(k, v)).collect(),
        other => Err(Error::InvalidFilter(format!(
            "'{key}' expects an array or object, got {}",
            type_name(other)
        ))),
    }
}

fn parse_predicate(field: &str, value: &Value) -> Result<Predicate> {
    match value {
        Value::Object(map) if map.contains_key(REGEX) => parse_regex(field, map),
        Value::Array(pair) if pair.len() == 2 => Ok(Predicate::Between(pair[0].clone(), pair[1].clone())),
        literal => Ok(Predicate::Equals(literal.clone())),
    }
}

fn parse_regex(field: &str, map: &Map<String, Value>) -> Result<Predicate> {
    let pattern = map.get(REGEX).and_then(Value::as_str).ok_or_else(|| {
        Error::InvalidFilter(format!("'{REGEX}' for field '{field}' must be a string"))
    })?;
    let options = map.get(OPTIONS).and_then(Value::as_str).unwrap_or("");

    if let Some(bad) = options.chars().find(|c| !matches!(c, 'i' | 'm' | 's' | 'x')) {
        return Err(Error::InvalidFilter(format!(
            "unknown regex option '{bad}' for field '{field}'"
        )));
    }
    // Options become inline flags so the pattern's source carries them.
    let source = if options.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{options}){pattern}")
    };
    let regex = Regex::new(&source).map_err(|source| Error::InvalidPattern {
        field: field.to_string(),
        source,
    })?;
    Ok(Predicate::Matches(regex))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
