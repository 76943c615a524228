//! Interactive CSV import: header check, per-row skip counting, append.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::warn;

use crate::{
    db::Store,
    error::{IMPORT_ROW_INCOMPLETE, IMPORT_ROW_MALFORMED, IMPORT_ROW_REJECTED, SCHEMA_EMPTY_CSV},
    model::{ContactFields, CSV_COLUMNS},
    repo::{self, OnRowError},
    AppError, AppResult,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        format!("Imported {} contacts.\nSkipped: {}", self.inserted, self.skipped)
    }
}

/// Lowercased, trimmed header name → first column index carrying it.
pub(crate) fn header_index(headers: &StringRecord) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (pos, name) in headers.iter().enumerate() {
        let key = name.trim_start_matches('\u{feff}').trim().to_lowercase();
        index.entry(key).or_insert(pos);
    }
    index
}

/// Positions of the six record columns, or the list of absent ones.
pub(crate) fn locate_columns(
    index: &HashMap<String, usize>,
) -> Result<[usize; 6], Vec<&'static str>> {
    let mut positions = [0usize; 6];
    let mut missing = Vec::new();
    for (slot, column) in CSV_COLUMNS.iter().enumerate() {
        match index.get(*column) {
            Some(pos) => positions[slot] = *pos,
            None => missing.push(*column),
        }
    }
    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(missing)
    }
}

fn cell(record: &StringRecord, pos: usize) -> String {
    record.get(pos).unwrap_or_default().trim().to_string()
}

fn row_fields(record: &StringRecord, positions: &[usize; 6]) -> ContactFields {
    ContactFields {
        first_name: cell(record, positions[0]),
        last_name: cell(record, positions[1]),
        gender: cell(record, positions[2]),
        age: cell(record, positions[3]),
        address: cell(record, positions[4]),
        contact: cell(record, positions[5]),
    }
}

/// Rows kept for the store, keyed by the line they start on.
#[derive(Debug, Default)]
struct ParsedRows {
    rows: Vec<(u64, ContactFields)>,
    skipped: Vec<u64>,
}

/// Read every data record after the header. Quoted fields may span lines, so
/// line numbers come from the reader rather than a record counter.
fn read_rows<R: io::Read>(
    reader: &mut Reader<R>,
    positions: &[usize; 6],
) -> AppResult<ParsedRows> {
    let mut parsed = ParsedRows::default();
    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let line = record.position().map_or(0, |pos| pos.line());
                let fields = row_fields(&record, positions);
                if fields.first_name.is_empty()
                    || fields.last_name.is_empty()
                    || fields.contact.is_empty()
                {
                    log_skip(
                        line,
                        &AppError::new(
                            IMPORT_ROW_INCOMPLETE,
                            "Row is missing firstname, lastname or contact.",
                        ),
                    );
                    parsed.skipped.push(line);
                    continue;
                }
                parsed.rows.push((line, fields));
            }
            Err(err) if err.is_io_error() => return Err(AppError::from(err)),
            Err(err) => {
                let line = err
                    .position()
                    .map_or_else(|| reader.position().line(), |pos| pos.line());
                let err = AppError::new(IMPORT_ROW_MALFORMED, "Row could not be read.")
                    .with_cause(AppError::from(err));
                log_skip(line, &err);
                parsed.skipped.push(line);
            }
        }
    }
    Ok(parsed)
}

fn log_skip(line: u64, err: &AppError) {
    warn!(
        target: "contactdesk",
        event = "import_row_skipped",
        line,
        code = err.code(),
        message = err.message()
    );
}

/// Append every usable row of `path` to the store.
///
/// Rows with an empty first name, last name or contact, rows the CSV reader
/// cannot decode, and rows the store rejects are skipped and counted. Other
/// fields are taken as-is (trimmed); the form rules do not apply here.
pub async fn import_csv(store: &Store, path: &Path) -> AppResult<ImportReport> {
    if !path.exists() {
        return Err(AppError::missing_resource(path));
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|err| AppError::from(err).with_context("path", path.display().to_string()))?;

    let headers = reader
        .headers()
        .map_err(|err| AppError::from(err).with_context("path", path.display().to_string()))?
        .clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::new(SCHEMA_EMPTY_CSV, "CSV file is empty or invalid.")
            .with_context("path", path.display().to_string()));
    }
    let positions = locate_columns(&header_index(&headers))
        .map_err(|missing| AppError::missing_columns(&missing))?;

    let parsed = read_rows(&mut reader, &positions)
        .map_err(|err| err.with_context("path", path.display().to_string()))?;
    let mut report = ImportReport {
        inserted: 0,
        skipped: parsed.skipped.len(),
    };
    let (pending_lines, pending): (Vec<u64>, Vec<ContactFields>) =
        parsed.rows.into_iter().unzip();

    if !pending.is_empty() {
        let outcome = repo::append_rows(store, &pending, OnRowError::Skip).await?;
        for (idx, cause) in outcome.rejected {
            let err =
                AppError::new(IMPORT_ROW_REJECTED, "Store rejected the row.").with_cause(cause);
            log_skip(pending_lines.get(idx).copied().unwrap_or_default(), &err);
            report.skipped += 1;
        }
        report.inserted = outcome.inserted;
    }

    Ok(report)
}
