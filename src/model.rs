use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

pub const VALIDATION_FIRSTNAME_REQUIRED: &str = "VALIDATION/FIRSTNAME_REQUIRED";
pub const VALIDATION_LASTNAME_REQUIRED: &str = "VALIDATION/LASTNAME_REQUIRED";
pub const VALIDATION_GENDER_REQUIRED: &str = "VALIDATION/GENDER_REQUIRED";
pub const VALIDATION_AGE_REQUIRED: &str = "VALIDATION/AGE_REQUIRED";
pub const VALIDATION_AGE_NOT_NUMBER: &str = "VALIDATION/AGE_NOT_NUMBER";
pub const VALIDATION_AGE_NOT_POSITIVE: &str = "VALIDATION/AGE_NOT_POSITIVE";
pub const VALIDATION_ADDRESS_REQUIRED: &str = "VALIDATION/ADDRESS_REQUIRED";
pub const VALIDATION_CONTACT_REQUIRED: &str = "VALIDATION/CONTACT_REQUIRED";
pub const VALIDATION_CONTACT_NOT_DIGITS: &str = "VALIDATION/CONTACT_NOT_DIGITS";
pub const VALIDATION_CONTACT_TOO_SHORT: &str = "VALIDATION/CONTACT_TOO_SHORT";

pub const MIN_CONTACT_LEN: usize = 7;
pub const UNKNOWN_GENDER: &str = "Unknown";

/// Column names used by every CSV the tools read or write, in record order.
pub const CSV_COLUMNS: [&str; 6] = ["firstname", "lastname", "gender", "age", "address", "contact"];
pub const FULL_NAME_COLUMN: &str = "full_name";

/// Field values as typed into a form, before trimming or validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDraft {
    #[serde(alias = "firstname")]
    pub first_name: String,
    #[serde(alias = "lastname")]
    pub last_name: String,
    pub gender: String,
    pub age: String,
    pub address: String,
    pub contact: String,
}

/// Trimmed field values that passed validation (or came from a trusted bulk source).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age: String,
    pub address: String,
    pub contact: String,
}

impl ContactFields {
    pub fn as_csv_record(&self) -> [&str; 6] {
        [
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.gender.as_str(),
            self.age.as_str(),
            self.address.as_str(),
            self.contact.as_str(),
        ]
    }
}

/// A stored contact row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    #[serde(flatten)]
    pub fields: ContactFields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    LastNameAsc,
    IdAsc,
}

/// Read filter for the gateway's `query`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContactFilter {
    #[default]
    All,
    Id(i64),
    /// Substring match over first name, last name and contact.
    Contains { term: String, case_sensitive: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactStats {
    pub total: i64,
    pub by_gender: BTreeMap<String, i64>,
}

impl ContactStats {
    /// Text shown by the statistics report.
    pub fn render(&self) -> String {
        let mut gender_text = String::new();
        for (label, count) in &self.by_gender {
            let _ = writeln!(gender_text, "{label}: {count}");
        }
        if gender_text.is_empty() {
            gender_text.push_str("No data\n");
        }
        format!("Total contacts: {}\n\nBy gender:\n{}", self.total, gender_text)
    }
}
