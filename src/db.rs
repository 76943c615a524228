//! Connection handling for the `member` store.
//!
//! Every gateway operation opens its own connection through [`Store::connect`]
//! and hands it back to [`Store::release`] before returning, on the error path
//! as well as the success path. Nothing is pooled.

use std::fs;

use sqlx::any::install_default_drivers;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{AnyConnection, ConnectOptions, Connection};
use tracing::{debug, error, info, warn};

use crate::config::{Backend, SearchOptions, StoreConfig};
use crate::{AppError, AppResult};

pub mod dialect;

pub use dialect::Dialect;

#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
    dialect: Dialect,
}

impl Store {
    pub fn new(config: &StoreConfig) -> Self {
        install_default_drivers();
        Self {
            config: config.clone(),
            dialect: Dialect::for_backend(&config.backend),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn search_options(&self) -> SearchOptions {
        self.config.search
    }

    /// Human readable location, never including credentials.
    pub fn describe(&self) -> String {
        match &self.config.backend {
            Backend::Sqlite { path } => format!("sqlite:{}", path.display()),
            Backend::MySql {
                host,
                port,
                database,
                ..
            } => format!("mysql://{host}:{port}/{database}"),
        }
    }

    fn connect_url(&self) -> AppResult<String> {
        match &self.config.backend {
            Backend::Sqlite { path } => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|err| {
                        error!(
                            target: "contactdesk",
                            event = "db_parent_create_failed",
                            error = %err,
                            path = %parent.display()
                        );
                        AppError::from(err).with_context("operation", "create_db_parent")
                    })?;
                }
                Ok(format!("sqlite:{}?mode=rwc", path.display()))
            }
            Backend::MySql {
                host,
                port,
                user,
                password,
                database,
            } => {
                let opts = MySqlConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .password(password)
                    .database(database);
                Ok(opts.to_url_lossy().to_string())
            }
        }
    }

    pub(crate) async fn connect(&self, operation: &'static str) -> AppResult<AnyConnection> {
        let url = self.connect_url()?;
        match AnyConnection::connect(&url).await {
            Ok(conn) => {
                debug!(
                    target: "contactdesk",
                    event = "db_connect",
                    backend = self.config.backend.name(),
                    operation
                );
                Ok(conn)
            }
            Err(err) => {
                error!(
                    target: "contactdesk",
                    event = "db_connect_failed",
                    backend = self.config.backend.name(),
                    location = %self.describe(),
                    operation,
                    error = %err
                );
                Err(AppError::from(err)
                    .with_context("operation", operation)
                    .with_context("store", self.describe()))
            }
        }
    }

    pub(crate) async fn release(&self, conn: AnyConnection, operation: &'static str) {
        if let Err(err) = conn.close().await {
            warn!(
                target: "contactdesk",
                event = "db_close_failed",
                operation,
                error = %err
            );
        }
    }

    /// Create the `member` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> AppResult<()> {
        let mut conn = self.connect("ensure_schema").await?;
        let result = sqlx::query(self.dialect.create_member_table())
            .execute(&mut conn)
            .await;
        self.release(conn, "ensure_schema").await;
        result.map_err(|err| store_error(err, "ensure_schema"))?;
        info!(
            target: "contactdesk",
            event = "db_schema_ready",
            backend = self.config.backend.name(),
            location = %self.describe()
        );
        Ok(())
    }
}

pub(crate) fn store_error(err: sqlx::Error, operation: &'static str) -> AppError {
    AppError::from(err).with_context("operation", operation)
}
