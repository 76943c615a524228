//! Store configuration, resolved once at startup and handed to [`crate::db::Store`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AppError, CONFIG_INVALID_BACKEND, CONFIG_INVALID_VALUE, CONFIG_UNREADABLE};

pub const ENV_BACKEND: &str = "CONTACTDESK_DB_BACKEND";
pub const ENV_SQLITE_PATH: &str = "CONTACTDESK_SQLITE_PATH";
pub const ENV_MYSQL_HOST: &str = "CONTACTDESK_MYSQL_HOST";
pub const ENV_MYSQL_PORT: &str = "CONTACTDESK_MYSQL_PORT";
pub const ENV_MYSQL_USER: &str = "CONTACTDESK_MYSQL_USER";
pub const ENV_MYSQL_PASSWORD: &str = "CONTACTDESK_MYSQL_PASSWORD";
pub const ENV_MYSQL_DATABASE: &str = "CONTACTDESK_MYSQL_DATABASE";
pub const ENV_SEARCH_CASE_SENSITIVE: &str = "CONTACTDESK_SEARCH_CASE_SENSITIVE";

pub const DEFAULT_SQLITE_FILE: &str = "contacts.sqlite3";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown database backend `{0}` (expected `sqlite` or `mysql`)")]
    InvalidBackend(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("cannot read config file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::InvalidBackend(_) => CONFIG_INVALID_BACKEND,
            ConfigError::InvalidValue { .. } => CONFIG_INVALID_VALUE,
            ConfigError::Unreadable { .. } => CONFIG_UNREADABLE,
        };
        AppError::new(code, err.to_string())
    }
}

/// Which store driver to talk to, with its connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Backend {
    Sqlite {
        path: PathBuf,
    },
    #[serde(rename = "mysql")]
    MySql {
        host: String,
        #[serde(default = "default_mysql_port")]
        port: u16,
        user: String,
        #[serde(default)]
        password: String,
        database: String,
    },
}

fn default_mysql_port() -> u16 {
    DEFAULT_MYSQL_PORT
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite { .. } => "sqlite",
            Backend::MySql { .. } => "mysql",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(flatten)]
    pub backend: Backend,
    #[serde(default)]
    pub search: SearchOptions,
}

impl StoreConfig {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Sqlite { path: path.into() },
            search: SearchOptions::default(),
        }
    }

    pub fn with_search(mut self, search: SearchOptions) -> Self {
        self.search = search;
        self
    }

    /// Parse a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|err| ConfigError::InvalidValue {
                key: "config",
                value: err.to_string(),
            })?;
        if let Some(name) = value.get("backend").and_then(|v| v.as_str()) {
            parse_backend_name(name)?;
        }
        serde_json::from_value(value).map_err(|err| ConfigError::InvalidValue {
            key: "config",
            value: err.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_json(&raw)
    }

    /// Build a config from `CONTACTDESK_*` variables looked up through `lookup`.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_name = lookup(ENV_BACKEND).unwrap_or_else(|| "sqlite".to_string());
        let backend = match parse_backend_name(&backend_name)? {
            BackendKind::Sqlite => Backend::Sqlite {
                path: lookup(ENV_SQLITE_PATH)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_FILE)),
            },
            BackendKind::MySql => {
                let port = match lookup(ENV_MYSQL_PORT) {
                    Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                        key: ENV_MYSQL_PORT,
                        value: raw,
                    })?,
                    None => DEFAULT_MYSQL_PORT,
                };
                Backend::MySql {
                    host: lookup(ENV_MYSQL_HOST).unwrap_or_else(|| "localhost".to_string()),
                    port,
                    user: lookup(ENV_MYSQL_USER).unwrap_or_else(|| "root".to_string()),
                    password: lookup(ENV_MYSQL_PASSWORD).unwrap_or_default(),
                    database: lookup(ENV_MYSQL_DATABASE)
                        .unwrap_or_else(|| "contact_db".to_string()),
                }
            }
        };

        let case_sensitive = match lookup(ENV_SEARCH_CASE_SENSITIVE) {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                key: ENV_SEARCH_CASE_SENSITIVE,
                value: raw,
            })?,
            None => false,
        };

        Ok(Self {
            backend,
            search: SearchOptions { case_sensitive },
        })
    }

    /// Resolve the effective configuration: config file, else environment,
    /// then apply an explicit SQLite path override.
    pub fn resolve(
        config_file: Option<&Path>,
        db_override: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::from_vars(|key| std::env::var(key).ok())?,
        };
        if let Some(path) = db_override {
            config.backend = Backend::Sqlite {
                path: path.to_path_buf(),
            };
        }
        Ok(config)
    }
}

enum BackendKind {
    Sqlite,
    MySql,
}

fn parse_backend_name(raw: &str) -> Result<BackendKind, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sqlite" => Ok(BackendKind::Sqlite),
        "mysql" => Ok(BackendKind::MySql),
        _ => Err(ConfigError::InvalidBackend(raw.to_string())),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
