// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-key sorting of records.
//!
//! A sort spec is an ordered list of keys. The JSON form is an object whose
//! entry order gives key priority:
//!
//! ```text
//! {"age": "desc", "name": "asc"}
//! {"age": -1, "name": 1}
//! {"age": [true, "asc"]}     # [nulls_first, direction]
//! ```
//!
//! Values of different types order by type: null, bool, number, string,
//! array, object. Sorting is stable.

use std::cmp::Ordering;

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::record::HasFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Where null and absent values go, independent of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsPosition {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
    /// `None` leaves nulls where the type order puts them.
    pub nulls: Option<NullsPosition>,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        SortKey { field: field.into(), direction, nulls: None }
    }

    fn compare<T: HasFields + ?Sized>(&self, a: &T, b: &T) -> Ordering {
        let left = a.fields().get(&self.field).unwrap_or(&Value::Null);
        let right = b.fields().get(&self.field).unwrap_or(&Value::Null);

        if let Some(nulls) = self.nulls {
            match (left.is_null(), right.is_null()) {
                (true, true) => return Ordering::Equal,
                (true, false) => return nulls_side(nulls),
                (false, true) => return nulls_side(nulls).reverse(),
                (false, false) => {}
            }
        }

        let ordering = compare_values(left, right);
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

fn nulls_side(nulls: NullsPosition) -> Ordering {
    match nulls {
        NullsPosition::First => Ordering::Less,
        NullsPosition::Last => Ordering::Greater,
    }
}

/// An ordered list of sort keys. The empty spec keeps input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        SortSpec::default()
    }

    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.keys.push(SortKey::new(field, Direction::Asc));
        self
    }

    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.keys.push(SortKey::new(field, Direction::Desc));
        self
    }

    /// Sets the null placement of the most recently added key.
    pub fn nulls(mut self, position: NullsPosition) -> Self {
        if let Some(key) = self.keys.last_mut() {
            key.nulls = Some(position);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Parses the JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSort`] for anything but an object of
    /// direction tokens.
    pub fn from_json(value: &Value) -> Result<SortSpec> {
        let map = match value {
            Value::Null => return Ok(SortSpec::default()),
            Value::Object(map) => map,
            other => return Err(Error::InvalidSort(format!("expected an object, got {other}"))),
        };
        let keys = map
            .iter()
            .map(|(field, token)| parse_key(field, token))
            .collect::<Result<Vec<_>>>()?;
        Ok(SortSpec { keys })
    }

    /// Parses the JSON form from text.
    pub fn parse(input: &str) -> Result<SortSpec> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(SortSpec::default());
        }
        let value: Value = serde_json::from_str(trimmed)?;
        SortSpec::from_json(&value)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for key in &self.keys {
            let dir = match key.direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            let value = match key.nulls {
                None => json!(dir),
                Some(nulls) => json!([nulls == NullsPosition::First, dir]),
            };
            map.insert(key.field.clone(), value);
        }
        Value::Object(map)
    }

    /// Compares two records key by key.
    pub fn compare<T: HasFields + ?Sized>(&self, a: &T, b: &T) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

fn parse_key(field: &str, token: &Value) -> Result<SortKey> {
    match token {
        Value::Array(pair) => match pair.as_slice() {
            [Value::Bool(nulls_first), dir] => {
                let nulls = if *nulls_first { NullsPosition::First } else { NullsPosition::Last };
                Ok(SortKey { nulls: Some(nulls), ..SortKey::new(field, parse_direction(field, dir)?) })
            }
            _ => Err(Error::InvalidSort(format!(
                "'{field}': expected [nulls_first, direction]"
            ))),
        },
        other => Ok(SortKey::new(field, parse_direction(field, other)?)),
    }
}

fn parse_direction(field: &str, token: &Value) -> Result<Direction> {
    let direction = match token {
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Direction::Asc),
            "desc" | "descending" => Some(Direction::Desc),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(Direction::Asc),
            Some(-1) => Some(Direction::Desc),
            _ => None,
        },
        _ => None,
    };
    direction.ok_or_else(|| Error::InvalidSort(format!("'{field}': unknown direction {token}")))
}

/// Sorts records in place. Stable: ties keep their input order.
pub fn sort<T: HasFields>(records: &mut [T], spec: &SortSpec) {
    if spec.is_empty() {
        return;
    }
    records.sort_by(|a, b| spec.compare(a, b));
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b)
            .map(|(x, y)| compare_values(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Object(a), Value::Object(b)) => a.len().cmp(&b.len()).then_with(|| {
            a.iter()
                .zip(b.iter())
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare_values(va, vb)))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
#[path = "sort_tests.rs"]
mod tests;
