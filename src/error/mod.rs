use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use anyhow::Error as AnyhowError;
use csv::Error as CsvError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;
use sqlx::Error as SqlxError;
use std::io::Error as IoError;

pub const CONFIG_INVALID_BACKEND: &str = "CONFIG/INVALID_BACKEND";
pub const CONFIG_INVALID_VALUE: &str = "CONFIG/INVALID_VALUE";
pub const CONFIG_UNREADABLE: &str = "CONFIG/UNREADABLE";
pub const RESOURCE_MISSING: &str = "RESOURCE/MISSING";
pub const SCHEMA_MISSING_COLUMNS: &str = "SCHEMA/MISSING_COLUMNS";
pub const SCHEMA_EMPTY_CSV: &str = "SCHEMA/EMPTY_CSV";
pub const CONTACT_NOT_FOUND: &str = "CONTACT/NOT_FOUND";
pub const IMPORT_ROW_INCOMPLETE: &str = "IMPORT/ROW_INCOMPLETE";
pub const IMPORT_ROW_MALFORMED: &str = "IMPORT/ROW_MALFORMED";
pub const IMPORT_ROW_REJECTED: &str = "IMPORT/ROW_REJECTED";

/// Coarse classification of an [`AppError`], derived from its code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    MissingResource,
    Schema,
    Validation,
    NotFound,
    RowLevel,
    Store,
    Io,
    Other,
}

/// A structured application error that can be serialized and surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    /// Machine readable error code.
    pub code: String,
    /// Human friendly message that can be shown directly to the user.
    pub message: String,
    /// Arbitrary key/value pairs that provide additional context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
    /// Optional nested cause that preserves the error chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<AppError>>,
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Default code used when an upstream error does not expose a specific code.
    pub const UNKNOWN_CODE: &'static str = "APP/UNKNOWN";

    /// Construct a new application error with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        AppError {
            code: code.into(),
            message: message.into(),
            context: HashMap::new(),
            cause: None,
        }
    }

    pub fn missing_resource(path: &std::path::Path) -> Self {
        AppError::new(RESOURCE_MISSING, "File not found.")
            .with_context("path", path.display().to_string())
    }

    pub fn missing_columns(missing: &[&str]) -> Self {
        AppError::new(
            SCHEMA_MISSING_COLUMNS,
            "CSV must contain columns: firstname, lastname, gender, age, address, contact",
        )
        .with_context("missing", missing.join(","))
    }

    /// Returns the error code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the contextual metadata associated with the error.
    pub fn context(&self) -> &HashMap<String, String> {
        &self.context
    }

    /// Returns the nested cause if one is present.
    pub fn cause(&self) -> Option<&AppError> {
        self.cause.as_deref()
    }

    pub fn kind(&self) -> ErrorKind {
        let prefix = self.code.split('/').next().unwrap_or_default();
        match prefix {
            "CONFIG" => ErrorKind::Configuration,
            "RESOURCE" => ErrorKind::MissingResource,
            "SCHEMA" => ErrorKind::Schema,
            "VALIDATION" => ErrorKind::Validation,
            "CONTACT" => ErrorKind::NotFound,
            "IMPORT" => ErrorKind::RowLevel,
            "SQLX" => ErrorKind::Store,
            "IO" | "CSV" => ErrorKind::Io,
            _ => ErrorKind::Other,
        }
    }

    /// Adds a contextual key/value pair to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets the nested cause for the error.
    pub fn with_cause(mut self, cause: impl Into<AppError>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "[{}] {}", self.code, self.message)
        } else {
            let mut entries: Vec<_> = self.context.iter().collect();
            entries.sort();
            write!(f, "[{}] {} ({:?})", self.code, self.message, entries)
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl From<AnyhowError> for AppError {
    fn from(error: AnyhowError) -> Self {
        fn convert(err: &(dyn StdError + 'static)) -> AppError {
            if let Some(app) = err.downcast_ref::<AppError>() {
                return app.clone();
            }

            let mut root = AppError::new(AppError::UNKNOWN_CODE, err.to_string());
            if let Some(source) = err.source() {
                root.cause = Some(Box::new(convert(source)));
            }
            root
        }

        convert(error.as_ref())
    }
}

impl From<IoError> for AppError {
    fn from(error: IoError) -> Self {
        let code = format!("IO/{:?}", error.kind());
        let mut app_error = AppError::new(code, error.to_string());
        if let Some(os_code) = error.raw_os_error() {
            app_error = app_error.with_context("os_code", os_code.to_string());
        }
        app_error
    }
}

impl From<CsvError> for AppError {
    fn from(error: CsvError) -> Self {
        let position = error.position().map(|pos| pos.line());
        let mut app_error = match error.kind() {
            csv::ErrorKind::Io(err) => {
                AppError::new(format!("IO/{:?}", err.kind()), err.to_string())
            }
            csv::ErrorKind::Utf8 { .. } => AppError::new("CSV/UTF8", error.to_string()),
            csv::ErrorKind::UnequalLengths { .. } => {
                AppError::new("CSV/UNEQUAL_LENGTHS", error.to_string())
            }
            _ => AppError::new("CSV/ERROR", error.to_string()),
        };
        if let Some(line) = position {
            app_error = app_error.with_context("line", line.to_string());
        }
        app_error
    }
}

impl From<SerdeJsonError> for AppError {
    fn from(error: SerdeJsonError) -> Self {
        let code = if error.is_data() {
            "JSON/DATA"
        } else if error.is_syntax() {
            "JSON/SYNTAX"
        } else if error.is_eof() {
            "JSON/EOF"
        } else if error.is_io() {
            "JSON/IO"
        } else {
            "JSON/ERROR"
        };

        let mut app_error = AppError::new(code, error.to_string());
        let line = error.line();
        if line > 0 {
            app_error = app_error.with_context("line", line.to_string());
        }
        let column = error.column();
        if column > 0 {
            app_error = app_error.with_context("column", column.to_string());
        }
        app_error
    }
}

impl From<SqlxError> for AppError {
    fn from(error: SqlxError) -> Self {
        match error {
            SqlxError::RowNotFound => AppError::new("SQLX/ROW_NOT_FOUND", "Record not found"),
            SqlxError::ColumnNotFound(name) => {
                AppError::new("SQLX/COLUMN_NOT_FOUND", format!("Column not found: {name}"))
            }
            SqlxError::Configuration(err) => {
                AppError::new("SQLX/CONFIGURATION", err.to_string())
            }
            SqlxError::Io(err) => AppError::new("SQLX/IO", err.to_string())
                .with_cause(AppError::from(err)),
            SqlxError::Database(db) => {
                let mut app_error = AppError::new("SQLX/DATABASE", db.message().to_string());
                if let Some(code) = db.code() {
                    app_error = app_error.with_context("db_code", code.to_string());
                }
                if let Some(constraint) = db.constraint() {
                    app_error = app_error.with_context("constraint", constraint.to_string());
                }
                app_error
            }
            SqlxError::ColumnDecode { index, source } => {
                AppError::new("SQLX/COLUMN_DECODE", source.to_string())
                    .with_context("column_index", index.to_string())
            }
            SqlxError::Decode(decode_err) => AppError::new("SQLX/DECODE", decode_err.to_string()),
            other => AppError::new("SQLX/ERROR", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::path::Path;

    #[test]
    fn builds_error_with_context_and_cause() {
        let error = AppError::new("TEST/CODE", "Something went wrong")
            .with_context("entity", "member")
            .with_context("id", "12")
            .with_cause(AppError::new("TEST/INNER", "inner failure"));

        assert_eq!(error.code(), "TEST/CODE");
        assert_eq!(error.message(), "Something went wrong");
        assert_eq!(error.context().get("entity"), Some(&"member".to_string()));
        assert_eq!(error.context().get("id"), Some(&"12".to_string()));
        let cause = error.cause().expect("cause present");
        assert_eq!(cause.message(), "inner failure");
        assert_eq!(cause.code(), "TEST/INNER");
    }

    #[test]
    fn converts_anyhow_error_chain_into_nested_causes() {
        let err = (|| -> anyhow::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
                .context("failed to save file")
        })()
        .unwrap_err();

        let app_error = AppError::from(err);
        assert_eq!(app_error.code(), AppError::UNKNOWN_CODE);
        assert_eq!(app_error.message(), "failed to save file");

        let cause = app_error.cause().expect("io cause present");
        assert!(cause.message().contains("disk full"));
    }

    #[test]
    fn converts_anyhow_preserves_existing_app_error() {
        let inner = AppError::new("VALIDATION/AGE_REQUIRED", "Please enter Age.")
            .with_context("field", "age");
        let converted = AppError::from(AnyhowError::from(inner.clone()));
        assert_eq!(converted, inner);
    }

    #[test]
    fn kinds_follow_code_prefix() {
        assert_eq!(
            AppError::new(CONFIG_INVALID_BACKEND, "x").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            AppError::missing_resource(Path::new("nope.csv")).kind(),
            ErrorKind::MissingResource
        );
        assert_eq!(AppError::missing_columns(&["age"]).kind(), ErrorKind::Schema);
        assert_eq!(
            AppError::new("VALIDATION/CONTACT_TOO_SHORT", "x").kind(),
            ErrorKind::Validation
        );
        assert_eq!(AppError::new(IMPORT_ROW_MALFORMED, "x").kind(), ErrorKind::RowLevel);
        assert_eq!(AppError::from(SqlxError::RowNotFound).kind(), ErrorKind::Store);
        assert_eq!(AppError::new(AppError::UNKNOWN_CODE, "x").kind(), ErrorKind::Other);
    }

    #[test]
    fn missing_columns_lists_names() {
        let err = AppError::missing_columns(&["age", "contact"]);
        assert_eq!(err.code(), SCHEMA_MISSING_COLUMNS);
        assert_eq!(err.context().get("missing"), Some(&"age,contact".to_string()));
    }

    #[test]
    fn io_error_contains_raw_code_when_available() {
        let err = IoError::from_raw_os_error(2);
        let app_error = AppError::from(err);
        assert_eq!(app_error.code(), "IO/NotFound");
        assert_eq!(app_error.context().get("os_code"), Some(&"2".to_string()));
        assert_eq!(app_error.kind(), ErrorKind::Io);
    }

    #[test]
    fn json_shape_is_flat_struct() {
        let error = AppError::new("VALIDATION/GENDER_REQUIRED", "Please select Gender.")
            .with_context("field", "gender");
        let json = serde_json::to_string(&error).expect("serialize app error");

        let value: serde_json::Value = serde_json::from_str(&json).expect("parse serialized error");
        assert_eq!(
            value.get("code").and_then(|v| v.as_str()),
            Some("VALIDATION/GENDER_REQUIRED")
        );
        assert_eq!(
            value
                .get("context")
                .and_then(|c| c.get("field"))
                .and_then(|v| v.as_str()),
            Some("gender")
        );
        assert!(value.get("cause").is_none());
    }
}
