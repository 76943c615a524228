//! Offline batch cleaner: extract a raw CSV, clean it, keep a side copy and
//! append the result to `member`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};

use crate::{
    db::Store,
    export::write_csv,
    model::{CSV_COLUMNS, FULL_NAME_COLUMN},
    repo::{self, OnRowError},
    AppError, AppResult,
};

pub mod transform;

pub use transform::{extract, transform, CleanedRow, CleanedTable, DropCounts, RawTable};

pub const DEFAULT_INPUT: &str = "contacts_raw.csv";
pub const DEFAULT_OUTPUT: &str = "contacts_clean.csv";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    #[default]
    Append,
    /// Delete existing rows before appending.
    Replace,
}

/// Write the cleaned table with its derived `full_name` column.
pub fn save(table: &CleanedTable, path: &Path) -> AppResult<usize> {
    let mut header: Vec<&str> = CSV_COLUMNS.to_vec();
    header.push(FULL_NAME_COLUMN);
    write_csv(path, &header, table.rows.iter().map(CleanedRow::csv_record))
}

/// Append every cleaned row. The first rejected row halts the load; rows
/// written before it stay.
pub async fn load(table: &CleanedTable, store: &Store, mode: LoadMode) -> AppResult<usize> {
    store.ensure_schema().await?;
    if mode == LoadMode::Replace {
        let removed = repo::clear(store).await?;
        info!(target: "contactdesk", event = "etl_cleared", removed);
    }
    let rows: Vec<_> = table.rows.iter().map(CleanedRow::to_fields).collect();
    let outcome = repo::append_rows(store, &rows, OnRowError::Stop).await?;
    Ok(outcome.inserted)
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: PathBuf,
    /// Side file for the cleaned table; `None` skips the save stage.
    pub output: Option<PathBuf>,
    pub mode: LoadMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: Some(PathBuf::from(DEFAULT_OUTPUT)),
            mode: LoadMode::Append,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub raw_rows: usize,
    pub cleaned_rows: usize,
    pub dropped: DropCounts,
    pub saved_to: Option<PathBuf>,
    pub inserted: usize,
}

/// Progress notifications emitted by [`run_pipeline_with`].
#[derive(Debug, Clone, Copy)]
pub enum Stage<'a> {
    Extracting { input: &'a Path },
    Transforming,
    Transformed { rows: usize },
    Saved { path: &'a Path },
    Loading { target: &'a str },
    Loaded { inserted: usize },
}

pub async fn run_pipeline(options: &PipelineOptions, store: &Store) -> AppResult<PipelineReport> {
    run_pipeline_with(options, store, |_| {}).await
}

/// Extract, transform, save (optional) and load, in that order. Any stage
/// error ends the run; side effects of finished stages are not undone.
pub async fn run_pipeline_with<F>(
    options: &PipelineOptions,
    store: &Store,
    mut on_stage: F,
) -> AppResult<PipelineReport>
where
    F: FnMut(Stage<'_>),
{
    let start = Instant::now();
    let result = async {
        on_stage(Stage::Extracting {
            input: &options.input,
        });
        let raw = extract(&options.input)?;
        info!(target: "contactdesk", event = "etl_extract", rows = raw.len());

        on_stage(Stage::Transforming);
        let cleaned = transform(&raw)?;
        info!(
            target: "contactdesk",
            event = "etl_transform",
            rows = cleaned.len(),
            invalid_age = cleaned.dropped.invalid_age,
            non_positive_age = cleaned.dropped.non_positive_age,
            duplicate_contact = cleaned.dropped.duplicate_contact
        );
        on_stage(Stage::Transformed {
            rows: cleaned.len(),
        });

        if let Some(path) = &options.output {
            save(&cleaned, path)?;
            info!(target: "contactdesk", event = "etl_save", path = %path.display());
            on_stage(Stage::Saved { path });
        }

        let target = store.describe();
        on_stage(Stage::Loading { target: &target });
        let inserted = load(&cleaned, store, options.mode).await?;
        info!(target: "contactdesk", event = "etl_load", inserted);
        on_stage(Stage::Loaded { inserted });

        Ok::<_, AppError>(PipelineReport {
            raw_rows: raw.len(),
            cleaned_rows: cleaned.len(),
            dropped: cleaned.dropped,
            saved_to: options.output.clone(),
            inserted,
        })
    }
    .await;

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(report) => info!(
            target: "contactdesk",
            event = "etl_done",
            duration_ms,
            inserted = report.inserted
        ),
        Err(err) => error!(
            target: "contactdesk",
            event = "etl_failed",
            duration_ms,
            code = err.code(),
            message = err.message()
        ),
    }
    result
}
