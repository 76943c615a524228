use std::collections::HashMap;
use std::time::Instant;

use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, ErrorKind};

fn context_to_json(context: &HashMap<String, String>) -> Option<Value> {
    if context.is_empty() {
        None
    } else {
        let mut map = Map::with_capacity(context.len());
        for (key, value) in context {
            map.insert(key.clone(), Value::String(value.clone()));
        }
        Some(Value::Object(map))
    }
}

fn wrap_details(value: Value) -> Value {
    if value.is_object() {
        value
    } else {
        json!({ "value": value })
    }
}

fn error_details(err: &AppError) -> Value {
    let mut map = Map::new();
    map.insert("code".into(), Value::String(err.code().to_string()));
    map.insert("message".into(), Value::String(err.message().to_string()));
    if let Some(context) = context_to_json(err.context()) {
        map.insert("context".into(), context);
    }
    Value::Object(map)
}

/// Timing and outcome logging around one application operation.
pub struct LogScope {
    cmd: &'static str,
    member_id: Option<i64>,
    start: Instant,
}

impl LogScope {
    pub fn new(cmd: &'static str, member_id: Option<i64>) -> Self {
        let scope = Self {
            cmd,
            member_id,
            start: Instant::now(),
        };
        debug!(
            target: "contactdesk",
            area = "contacts",
            cmd = scope.cmd,
            member_id = scope.member_id,
            details = %json!({ "stage": "enter" })
        );
        scope
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn success(&self, member_id: Option<i64>, details: Value) {
        info!(
            target: "contactdesk",
            area = "contacts",
            cmd = self.cmd,
            member_id = member_id.or(self.member_id),
            duration_ms = self.elapsed_ms(),
            details = %wrap_details(details)
        );
    }

    pub fn warn(&self, details: Value) {
        warn!(
            target: "contactdesk",
            area = "contacts",
            cmd = self.cmd,
            member_id = self.member_id,
            duration_ms = self.elapsed_ms(),
            details = %wrap_details(details)
        );
    }

    /// Caller-side mistakes log at warn; store and IO failures at error.
    pub fn fail(&self, err: &AppError) {
        match err.kind() {
            ErrorKind::Validation
            | ErrorKind::NotFound
            | ErrorKind::Schema
            | ErrorKind::MissingResource
            | ErrorKind::RowLevel => self.warn(error_details(err)),
            _ => error!(
                target: "contactdesk",
                area = "contacts",
                cmd = self.cmd,
                member_id = self.member_id,
                duration_ms = self.elapsed_ms(),
                details = %error_details(err)
            ),
        }
    }

    /// Log the outcome of `result` and pass it through unchanged.
    pub fn finish<T>(
        &self,
        result: AppResult<T>,
        details: impl FnOnce(&T) -> Value,
    ) -> AppResult<T> {
        match &result {
            Ok(value) => self.success(None, details(value)),
            Err(err) => self.fail(err),
        }
        result
    }
}
