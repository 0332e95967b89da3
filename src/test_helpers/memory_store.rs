//! In-memory find primitive over fixture rows.
//!
//! Understands enough of the query vocabulary to exercise scope merging end
//! to end: `conditions` (equality, `IN` lists, comparison operators in the
//! key, nested `OR`/`AND`/`NOT`), `order`, `group`, `limit` and `offset`.
//! Result shapes follow the usual row-per-alias layout; count finds return
//! `[{"0": {"count": n}}]`, one entry per group.

use crate::constants::query_keys;
use crate::model::FindExecutor;
use crate::query::{FindType, Query};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use thiserror::Error;

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MemoryStoreError {
    #[error("Unsupported find type: {0}")]
    UnsupportedFindType(String),
    #[error("Invalid query parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },
}

fn invalid(key: &str, reason: impl Into<String>) -> MemoryStoreError {
    MemoryStoreError::InvalidParameter {
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    alias: String,
    rows: Vec<Row>,
    rows_affected: AtomicU64,
}

impl MemoryStore {
    pub fn new(alias: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            alias: alias.into(),
            rows,
            rows_affected: AtomicU64::new(0),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn select(&self, query: &Query) -> Result<Vec<&Row>, MemoryStoreError> {
        let mut selected = Vec::new();
        for row in &self.rows {
            let keep = match query.get(query_keys::CONDITIONS) {
                Some(conditions) => self.matches(row, conditions)?,
                None => true,
            };
            if keep {
                selected.push(row);
            }
        }

        if let Some(order) = query.get(query_keys::ORDER) {
            let order = self.parse_order(order)?;
            selected.sort_by(|a, b| {
                order
                    .iter()
                    .map(|(field, descending)| {
                        let ordering = compare(
                            a.get(field).unwrap_or(&Value::Null),
                            b.get(field).unwrap_or(&Value::Null),
                        )
                        .unwrap_or(Ordering::Equal);
                        if *descending {
                            ordering.reverse()
                        } else {
                            ordering
                        }
                    })
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }
        Ok(selected)
    }

    fn page<'a>(
        &self,
        rows: Vec<&'a Row>,
        query: &Query,
    ) -> Result<Vec<&'a Row>, MemoryStoreError> {
        let offset = read_count(query, query_keys::OFFSET)?.unwrap_or(0);
        let limit = read_count(query, query_keys::LIMIT)?;
        let rows = rows.into_iter().skip(offset);
        Ok(match limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        })
    }

    fn matches(&self, row: &Row, conditions: &Value) -> Result<bool, MemoryStoreError> {
        match conditions {
            Value::Object(map) => {
                for (key, expected) in map {
                    if !self.matches_entry(row, key, expected)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Value::Array(items) => {
                for item in items {
                    if !self.matches(row, item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Value::Null => Ok(true),
            other => Err(invalid(
                query_keys::CONDITIONS,
                format!("raw condition {other} is not supported"),
            )),
        }
    }

    fn matches_entry(
        &self,
        row: &Row,
        key: &str,
        expected: &Value,
    ) -> Result<bool, MemoryStoreError> {
        match key.to_uppercase().as_str() {
            "OR" => return self.matches_any(row, expected),
            "AND" => return self.matches(row, expected),
            "NOT" => return self.matches(row, expected).map(|matched| !matched),
            _ => {}
        }
        if key.parse::<usize>().is_ok() {
            return self.matches(row, expected);
        }

        let mut parts = key.split_whitespace();
        let field = parts.next().unwrap_or_default();
        let operator = parts.next().unwrap_or("=");
        let field = self.column(field);
        let actual = row.get(field).unwrap_or(&Value::Null);

        if let Value::Array(candidates) = expected {
            let found = candidates.iter().any(|candidate| loosely_equal(actual, candidate));
            return match operator {
                "=" => Ok(found),
                "!=" | "<>" => Ok(!found),
                other => Err(invalid(key, format!("operator {other} does not accept a list"))),
            };
        }

        let ordering = compare(actual, expected);
        Ok(match operator {
            "=" => loosely_equal(actual, expected),
            "!=" | "<>" => !loosely_equal(actual, expected),
            ">" => ordering == Some(Ordering::Greater),
            ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            "<" => ordering == Some(Ordering::Less),
            "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            other => return Err(invalid(key, format!("unknown operator {other}"))),
        })
    }

    fn matches_any(&self, row: &Row, alternatives: &Value) -> Result<bool, MemoryStoreError> {
        match alternatives {
            Value::Object(map) => {
                for (key, expected) in map {
                    if self.matches_entry(row, key, expected)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Value::Array(items) => {
                for item in items {
                    if self.matches(row, item)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => self.matches(row, alternatives),
        }
    }

    /// Strip an `Alias.` qualifier from a column reference
    fn column<'a>(&self, field: &'a str) -> &'a str {
        field
            .strip_prefix(self.alias.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(field)
    }

    fn parse_order(&self, order: &Value) -> Result<Vec<(String, bool)>, MemoryStoreError> {
        let mut terms = Vec::new();
        match order {
            Value::String(text) => {
                for term in text.split(',') {
                    terms.push(self.parse_order_term(term.trim())?);
                }
            }
            Value::Array(items) => {
                for item in items {
                    terms.extend(self.parse_order(item)?);
                }
            }
            Value::Object(map) => {
                for (key, direction) in map {
                    if key.parse::<usize>().is_ok() {
                        terms.extend(self.parse_order(direction)?);
                    } else {
                        let direction = direction.as_str().unwrap_or("ASC");
                        terms.push(self.parse_order_term(&format!("{key} {direction}"))?);
                    }
                }
            }
            Value::Null => {}
            other => return Err(invalid(query_keys::ORDER, format!("unsupported order {other}"))),
        }
        Ok(terms)
    }

    fn parse_order_term(&self, term: &str) -> Result<(String, bool), MemoryStoreError> {
        let mut parts = term.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| invalid(query_keys::ORDER, "empty order term"))?;
        let descending = match parts.next().map(str::to_uppercase).as_deref() {
            None | Some("ASC") => false,
            Some("DESC") => true,
            Some(other) => {
                return Err(invalid(
                    query_keys::ORDER,
                    format!("unknown direction {other}"),
                ))
            }
        };
        Ok((self.column(field).to_string(), descending))
    }

    fn group_fields(&self, query: &Query) -> Vec<String> {
        let fields = match query.get(query_keys::GROUP) {
            Some(Value::String(text)) => text.split(',').map(|f| f.trim().to_string()).collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            Some(Value::Object(map)) => map
                .values()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        fields
            .iter()
            .filter(|field| !field.is_empty())
            .map(|field| self.column(field).to_string())
            .collect()
    }

    fn count(&self, rows: &[&Row], query: &Query) -> Value {
        let fields = self.group_fields(query);
        if fields.is_empty() {
            self.rows_affected.store(rows.len() as u64, AtomicOrdering::SeqCst);
            return json!([{ "0": { "count": rows.len() } }]);
        }

        let mut groups: Vec<(Vec<Value>, usize)> = Vec::new();
        for row in rows {
            let key: Vec<Value> = fields
                .iter()
                .map(|field| row.get(field).cloned().unwrap_or(Value::Null))
                .collect();
            match groups.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, count)) => *count += 1,
                None => groups.push((key, 1)),
            }
        }

        self.rows_affected.store(groups.len() as u64, AtomicOrdering::SeqCst);
        Value::Array(
            groups
                .into_iter()
                .map(|(_, count)| json!({ "0": { "count": count } }))
                .collect(),
        )
    }

    fn wrap(&self, row: &Row) -> Value {
        let mut wrapped = Map::new();
        wrapped.insert(self.alias.clone(), Value::Object(row.clone()));
        Value::Object(wrapped)
    }
}

impl FindExecutor for MemoryStore {
    type Error = MemoryStoreError;

    fn execute_find(&self, find_type: &FindType, query: &Query) -> Result<Value, Self::Error> {
        let selected = self.select(query)?;
        match find_type {
            FindType::Count => Ok(self.count(&selected, query)),
            FindType::All => {
                let rows = self.page(selected, query)?;
                self.rows_affected.store(rows.len() as u64, AtomicOrdering::SeqCst);
                Ok(Value::Array(rows.into_iter().map(|row| self.wrap(row)).collect()))
            }
            FindType::First => {
                let first = self.page(selected, query)?.into_iter().next();
                self.rows_affected
                    .store(u64::from(first.is_some()), AtomicOrdering::SeqCst);
                Ok(first.map_or(Value::Null, |row| self.wrap(row)))
            }
            FindType::List => {
                let rows = self.page(selected, query)?;
                self.rows_affected.store(rows.len() as u64, AtomicOrdering::SeqCst);
                let list: Map<String, Value> = rows
                    .into_iter()
                    .map(|row| {
                        let id = row.get("id").map(Value::to_string).unwrap_or_default();
                        (id, row.get("name").cloned().unwrap_or(Value::Null))
                    })
                    .collect();
                Ok(Value::Object(list))
            }
            other => Err(MemoryStoreError::UnsupportedFindType(other.to_string())),
        }
    }

    fn rows_affected(&self) -> u64 {
        self.rows_affected.load(AtomicOrdering::SeqCst)
    }
}

fn read_count(query: &Query, key: &str) -> Result<Option<usize>, MemoryStoreError> {
    match query.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| invalid(key, "expected a non-negative integer")),
        Some(Value::String(text)) => text
            .parse::<usize>()
            .map(Some)
            .map_err(|_| invalid(key, "expected a non-negative integer")),
        Some(other) => Err(invalid(key, format!("unsupported value {other}"))),
    }
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Bool(a), Value::Number(n)) | (Value::Number(n), Value::Bool(a)) => {
            n.as_i64() == Some(i64::from(*a))
        }
        _ => compare(actual, expected) == Some(Ordering::Equal) || actual == expected,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
