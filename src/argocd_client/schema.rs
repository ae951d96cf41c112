//! Structural validation of Argo CD application payloads.
//!
//! The walker runs over the loosely typed JSON tree before any typed decoding
//! and records every mismatch it finds, so a single response can report all of
//! its problems at once instead of stopping at the first one.

use std::fmt;

use chrono::DateTime;
use serde_json::{Map, Value};

/// One field that did not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl Violation {
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.path, self.expected, self.actual
        )
    }
}

/// Every violation found in one payload, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns true when any violation sits at `path` or below it.
    pub fn touches(&self, path: &str) -> bool {
        self.violations.iter().any(|v| {
            v.path == path
                || v.path
                    .strip_prefix(path)
                    .map(|rest| rest.starts_with('.') || rest.starts_with('['))
                    .unwrap_or(false)
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.violations.len();
        write!(
            f,
            "{} schema violation{}",
            count,
            if count == 1 { "" } else { "s" }
        )?;
        for (idx, violation) in self.violations.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{violation}")?;
        }
        Ok(())
    }
}

/// Validates a single application object, as returned by `GET /applications/{name}`.
pub fn validate_application(value: &Value) -> ValidationReport {
    let mut walker = Walker::default();
    walker.application(value, "");
    walker.finish()
}

/// Validates a `{items: [...]}` envelope, as returned by `GET /applications`.
///
/// `items: null` is how the API encodes an empty list and is accepted.
pub fn validate_application_list(value: &Value) -> ValidationReport {
    let mut walker = Walker::default();
    if let Some(root) = walker.root_object(value) {
        match root.get("items") {
            None => walker.push("items", "array", "missing"),
            Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (idx, item) in items.iter().enumerate() {
                    walker.application(item, &format!("items[{idx}]"));
                }
            }
            Some(other) => walker.push("items", "array", describe(other)),
        }
    }
    walker.finish()
}

pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

const TIMESTAMP: &str = "RFC 3339 timestamp";

#[derive(Default)]
struct Walker {
    violations: Vec<Violation>,
}

impl Walker {
    fn finish(self) -> ValidationReport {
        ValidationReport::new(self.violations)
    }

    fn push(&mut self, path: &str, expected: &str, actual: impl Into<String>) {
        self.violations.push(Violation::new(path, expected, actual));
    }

    fn root_object<'v>(&mut self, value: &'v Value) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.push("$", "object", describe(other));
                None
            }
        }
    }

    fn application(&mut self, value: &Value, path: &str) {
        let app = match value {
            Value::Object(map) => map,
            other => {
                self.push(if path.is_empty() { "$" } else { path }, "object", describe(other));
                return;
            }
        };

        if let Some(metadata) = self.object(app, path, "metadata") {
            self.string(metadata, &join(path, "metadata"), "name");
        }

        let status_path = join(path, "status");
        let Some(status) = self.object(app, path, "status") else {
            return;
        };
        if let Some(sync) = self.object(status, &status_path, "sync") {
            self.string(sync, &join(&status_path, "sync"), "status");
        }
        if let Some(health) = self.object(status, &status_path, "health") {
            self.string(health, &join(&status_path, "health"), "status");
        }
        if let Some(operation) = self.object(status, &status_path, "operationState") {
            self.timestamp(operation, &join(&status_path, "operationState"), "finishedAt");
        }
        let history_path = join(&status_path, "history");
        if let Some(history) = self.array(status, &status_path, "history") {
            for (idx, entry) in history.iter().enumerate() {
                self.history_entry(entry, &format!("{history_path}[{idx}]"));
            }
        }
    }

    fn history_entry(&mut self, value: &Value, path: &str) {
        let Value::Object(entry) = value else {
            self.push(path, "object", describe(value));
            return;
        };
        self.integer(entry, path, "id");
        self.string(entry, path, "revision");
        self.timestamp(entry, path, "deployedAt");
        match entry.get("deployStartedAt") {
            None | Some(Value::Null) => {}
            Some(_) => self.timestamp(entry, path, "deployStartedAt"),
        }
    }

    fn field<'v>(
        &mut self,
        parent: &'v Map<String, Value>,
        path: &str,
        key: &str,
        expected: &str,
    ) -> Option<&'v Value> {
        let value = parent.get(key);
        if value.is_none() {
            self.push(&join(path, key), expected, "missing");
        }
        value
    }

    fn object<'v>(
        &mut self,
        parent: &'v Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'v Map<String, Value>> {
        match self.field(parent, path, key, "object")? {
            Value::Object(map) => Some(map),
            other => {
                self.push(&join(path, key), "object", describe(other));
                None
            }
        }
    }

    fn array<'v>(
        &mut self,
        parent: &'v Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'v Vec<Value>> {
        match self.field(parent, path, key, "array")? {
            Value::Array(items) => Some(items),
            other => {
                self.push(&join(path, key), "array", describe(other));
                None
            }
        }
    }

    fn string(&mut self, parent: &Map<String, Value>, path: &str, key: &str) {
        match self.field(parent, path, key, "string") {
            Some(Value::String(_)) | None => {}
            Some(other) => self.push(&join(path, key), "string", describe(other)),
        }
    }

    fn integer(&mut self, parent: &Map<String, Value>, path: &str, key: &str) {
        match self.field(parent, path, key, "integer") {
            Some(Value::Number(n)) if n.is_i64() => {}
            None => {}
            Some(other) => self.push(&join(path, key), "integer", describe(other)),
        }
    }

    fn timestamp(&mut self, parent: &Map<String, Value>, path: &str, key: &str) {
        match self.field(parent, path, key, TIMESTAMP) {
            Some(Value::String(raw)) => {
                if DateTime::parse_from_rfc3339(raw).is_err() {
                    self.push(&join(path, key), TIMESTAMP, format!("string {raw:?}"));
                }
            }
            None => {}
            Some(other) => self.push(&join(path, key), TIMESTAMP, describe(other)),
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
