//! Rows and the scan-side hit collector.
//!
//! A [`Record`] is one row: a mapping from column name to [`Value`]. Records
//! are built by the scan operator, passed through the pipeline, and trimmed
//! by projection before reaching the caller.
//!
//! A [`RowResult`] wraps a record with the bytes read to produce it and an
//! optional row-level error. Row-level errors surface upstream without
//! stopping the stream.

use crate::error::Error;
use crate::types::Value;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// One row: column name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Drops every column whose name is not in `keep`. Projection pruning
    /// operates on the operator's owned copy before forwarding.
    pub fn retain_columns(&mut self, keep: &[String]) {
        self.values.retain(|name, _| keep.iter().any(|k| k == name));
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        write!(f, "{{")?;
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, self.values[*key])?;
        }
        write!(f, "}}")
    }
}

/// One element of an operator stream.
#[derive(Debug)]
pub struct RowResult {
    pub record: Record,
    pub bytes_read: u64,
    pub error: Option<Error>,
}

impl RowResult {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            bytes_read: 0,
            error: None,
        }
    }
}

/// Accumulates decoded field values for the hit currently being visited and
/// queues one [`RowResult`] per hit.
///
/// The index store drives it: `add_value` per decoded field, `set_bytes` +
/// `emit` once per hit, `close` when the hit iterator is exhausted. Decode
/// failures attach to the in-flight row via `fail_row`; failures that
/// invalidate the whole scan go through `abort`.
#[derive(Debug, Default)]
pub struct HitCollector {
    current: Record,
    bytes: u64,
    row_error: Option<Error>,
    terminal: Option<Error>,
    queue: VecDeque<RowResult>,
    closed: bool,
}

impl HitCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&mut self, name: &str, value: Value) {
        self.current.insert(name, value);
    }

    pub fn set_bytes(&mut self, bytes: u64) {
        self.bytes = bytes;
    }

    /// Attaches a row-level error to the hit currently being collected.
    pub fn fail_row(&mut self, error: Error) {
        self.row_error = Some(error);
    }

    /// Marks the whole scan as failed. The scan operator observes this after
    /// the search returns.
    pub fn abort(&mut self, error: Error) {
        if self.terminal.is_none() {
            self.terminal = Some(error);
        }
    }

    /// Finishes the current hit and starts a fresh one.
    pub fn emit(&mut self) {
        let record = std::mem::take(&mut self.current);
        let error = self.row_error.take();
        self.queue.push_back(RowResult {
            record,
            bytes_read: self.bytes,
            error,
        });
        self.bytes = 0;
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn take_terminal(&mut self) -> Option<Error> {
        self.terminal.take()
    }

    pub fn pop(&mut self) -> Option<RowResult> {
        self.queue.pop_front()
    }
}
