pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod etl;
pub mod export;
pub mod import;
pub mod logging;
pub mod model;
pub mod op_logging;
pub mod repo;
pub mod search;
pub mod validation;

pub use config::{Backend, ConfigError, SearchOptions, StoreConfig};
pub use db::Store;
pub use error::{AppError, AppResult, ErrorKind};
