use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;

use crate::{
    error::SCHEMA_EMPTY_CSV,
    import::{header_index, locate_columns},
    model::ContactFields,
    AppError, AppResult,
};

/// A CSV file as read: header names and string cells, untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedRow {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age: i64,
    pub address: String,
    pub contact: String,
    pub full_name: String,
}

impl CleanedRow {
    /// Store representation; age becomes its decimal text.
    pub fn to_fields(&self) -> ContactFields {
        ContactFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            age: self.age.to_string(),
            address: self.address.clone(),
            contact: self.contact.clone(),
        }
    }

    pub fn csv_record(&self) -> [String; 7] {
        [
            self.first_name.clone(),
            self.last_name.clone(),
            self.gender.clone(),
            self.age.to_string(),
            self.address.clone(),
            self.contact.clone(),
            self.full_name.clone(),
        ]
    }
}

/// Rows removed by each cleaning rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub invalid_age: usize,
    pub non_positive_age: usize,
    pub duplicate_contact: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.invalid_age + self.non_positive_age + self.duplicate_contact
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanedTable {
    pub rows: Vec<CleanedRow>,
    pub dropped: DropCounts,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read the raw batch file. Short rows are padded with empty cells.
pub fn extract(path: &Path) -> AppResult<RawTable> {
    if !path.exists() {
        return Err(AppError::missing_resource(path));
    }
    let with_path = |err: AppError| err.with_context("path", path.display().to_string());

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|err| with_path(err.into()))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| with_path(err.into()))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(with_path(AppError::new(
            SCHEMA_EMPTY_CSV,
            "CSV file is empty or invalid.",
        )));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| with_path(err.into()))?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.len() < headers.len() {
            cells.resize(headers.len(), String::new());
        }
        rows.push(cells);
    }

    Ok(RawTable { headers, rows })
}

/// Upper bound (2^63, exclusive) for an age whose truncation fits an `i64`.
const AGE_LIMIT: f64 = i64::MAX as f64;

/// Numeric reading of an age cell. Decimal and exponent forms are accepted;
/// blanks, junk, non-finite values and values too large to truncate exactly
/// are not.
pub(crate) fn coerce_age(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value < AGE_LIMIT).then_some(value)
}

/// Clean `raw` into the six contact columns plus `full_name`.
///
/// Order of rules: trim text, drop unreadable ages, drop ages <= 0, truncate
/// age, drop repeated contact numbers (first occurrence kept).
pub fn transform(raw: &RawTable) -> AppResult<CleanedTable> {
    let header_record = csv::StringRecord::from(raw.headers.clone());
    let positions = locate_columns(&header_index(&header_record))
        .map_err(|missing| AppError::missing_columns(&missing))?;

    let cell = |row: &[String], slot: usize| -> String {
        row.get(positions[slot])
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let mut table = CleanedTable::default();
    let mut seen_contacts: HashSet<String> = HashSet::new();

    for row in &raw.rows {
        let age = match coerce_age(&cell(row, 3)) {
            Some(age) => age,
            None => {
                table.dropped.invalid_age += 1;
                continue;
            }
        };
        if age <= 0.0 {
            table.dropped.non_positive_age += 1;
            continue;
        }

        let contact = cell(row, 5);
        if !seen_contacts.insert(contact.clone()) {
            table.dropped.duplicate_contact += 1;
            continue;
        }

        let first_name = cell(row, 0);
        let last_name = cell(row, 1);
        let full_name = format!("{first_name} {last_name}");
        table.rows.push(CleanedRow {
            first_name,
            last_name,
            gender: cell(row, 2),
            age: age.trunc() as i64,
            address: cell(row, 4),
            contact,
            full_name,
        });
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[[&str; 6]]) -> RawTable {
        RawTable {
            headers: ["firstname", "lastname", "gender", "age", "address", "contact"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn age_coercion_accepts_numbers_only() {
        assert_eq!(coerce_age(" 7 "), Some(7.0));
        assert_eq!(coerce_age("30.0"), Some(30.0));
        assert_eq!(coerce_age("abc"), None);
        assert_eq!(coerce_age(""), None);
        assert_eq!(coerce_age("NaN"), None);
        assert_eq!(coerce_age("inf"), None);
        assert_eq!(coerce_age("1e19"), None);
        assert_eq!(coerce_age("9223372036854775808"), None);
    }

    #[test]
    fn invalid_and_non_positive_ages_are_dropped() {
        let table = transform(&raw(&[
            ["A", "One", "M", "abc", "x", "1"],
            ["B", "Two", "M", "0", "x", "2"],
            ["C", "Three", "M", "-5", "x", "3"],
            ["D", "Four", "M", "", "x", "4"],
            ["E", "Five", "M", "5", "x", "5"],
        ]))
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].first_name, "E");
        assert_eq!(table.rows[0].age, 5);
        assert_eq!(
            table.dropped,
            DropCounts {
                invalid_age: 2,
                non_positive_age: 2,
                duplicate_contact: 0
            }
        );
    }

    #[test]
    fn ages_beyond_integer_range_count_as_invalid() {
        let table = transform(&raw(&[
            ["A", "One", "M", "1e19", "x", "1"],
            ["B", "Two", "M", "9.2e18", "x", "2"],
        ]))
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].age, 9_200_000_000_000_000_000);
        assert_eq!(table.dropped.invalid_age, 1);
    }

    #[test]
    fn fractional_age_truncates() {
        let table = transform(&raw(&[["A", "B", "F", "41.9", "x", "1"]])).unwrap();
        assert_eq!(table.rows[0].age, 41);
    }

    #[test]
    fn duplicate_contacts_keep_first_row() {
        let table = transform(&raw(&[
            ["Amit", "Shah", "Male", "30", "Pune", "9876543210"],
            ["Riya", "Shah", "Female", "28", "Pune", " 9876543210 "],
        ]))
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].first_name, "Amit");
        assert_eq!(table.dropped.duplicate_contact, 1);
    }

    #[test]
    fn headers_are_normalized_and_extras_dropped() {
        let table = RawTable {
            headers: vec![
                " ID ".into(),
                "FirstName".into(),
                "LastName".into(),
                "GENDER".into(),
                "Age".into(),
                "Address".into(),
                " Contact".into(),
            ],
            rows: vec![vec![
                "9".into(),
                "  Amit ".into(),
                "Shah".into(),
                "Male".into(),
                "30".into(),
                " Pune".into(),
                "9876543210".into(),
            ]],
        };
        let cleaned = transform(&table).unwrap();
        let row = &cleaned.rows[0];
        assert_eq!(row.first_name, "Amit");
        assert_eq!(row.address, "Pune");
        assert_eq!(row.full_name, "Amit Shah");
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let table = RawTable {
            headers: vec!["firstname".into(), "lastname".into(), "age".into()],
            rows: vec![],
        };
        let err = transform(&table).unwrap_err();
        assert_eq!(err.code(), crate::error::SCHEMA_MISSING_COLUMNS);
        assert_eq!(
            err.context().get("missing").map(String::as_str),
            Some("gender,address,contact")
        );
    }

    #[test]
    fn cleaned_row_stores_age_as_text() {
        let table = transform(&raw(&[["A", "B", "F", "30", "x", "1"]])).unwrap();
        assert_eq!(table.rows[0].to_fields().age, "30");
    }
}
