use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    model::{
        ContactDraft, ContactFields, MIN_CONTACT_LEN, VALIDATION_ADDRESS_REQUIRED,
        VALIDATION_AGE_NOT_NUMBER, VALIDATION_AGE_NOT_POSITIVE, VALIDATION_AGE_REQUIRED,
        VALIDATION_CONTACT_NOT_DIGITS, VALIDATION_CONTACT_REQUIRED, VALIDATION_CONTACT_TOO_SHORT,
        VALIDATION_FIRSTNAME_REQUIRED, VALIDATION_GENDER_REQUIRED, VALIDATION_LASTNAME_REQUIRED,
    },
    AppError, AppResult,
};

static DIGITS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("digits validation pattern to compile"));

fn reject(code: &str, message: &str, field: &str) -> AppError {
    AppError::new(code, message).with_context("field", field.to_string())
}

fn require(value: &str, code: &str, message: &str, field: &str) -> AppResult<()> {
    if value.is_empty() {
        Err(reject(code, message, field))
    } else {
        Ok(())
    }
}

fn validate_age(age: &str) -> AppResult<()> {
    require(age, VALIDATION_AGE_REQUIRED, "Please enter Age.", "age")?;
    if !DIGITS_PATTERN.is_match(age) {
        return Err(
            reject(VALIDATION_AGE_NOT_NUMBER, "Age must be a number.", "age")
                .with_context("value", age.to_string()),
        );
    }
    // Digit strings of any length are fine; only an all-zero value is not positive.
    if age.bytes().all(|b| b == b'0') {
        return Err(reject(
            VALIDATION_AGE_NOT_POSITIVE,
            "Age must be greater than 0.",
            "age",
        ));
    }
    Ok(())
}

fn validate_contact(contact: &str) -> AppResult<()> {
    require(
        contact,
        VALIDATION_CONTACT_REQUIRED,
        "Please enter Contact number.",
        "contact",
    )?;
    if !DIGITS_PATTERN.is_match(contact) {
        return Err(reject(
            VALIDATION_CONTACT_NOT_DIGITS,
            "Contact must contain only digits.",
            "contact",
        ));
    }
    if contact.len() < MIN_CONTACT_LEN {
        return Err(reject(
            VALIDATION_CONTACT_TOO_SHORT,
            "Contact number looks too short.",
            "contact",
        )
        .with_context("length", contact.len().to_string()));
    }
    Ok(())
}

/// Trim every field and run the form rules in order, stopping at the first failure.
pub fn validate(draft: &ContactDraft) -> AppResult<ContactFields> {
    let fields = ContactFields {
        first_name: draft.first_name.trim().to_string(),
        last_name: draft.last_name.trim().to_string(),
        gender: draft.gender.trim().to_string(),
        age: draft.age.trim().to_string(),
        address: draft.address.trim().to_string(),
        contact: draft.contact.trim().to_string(),
    };

    require(
        &fields.first_name,
        VALIDATION_FIRSTNAME_REQUIRED,
        "Please enter Firstname.",
        "first_name",
    )?;
    require(
        &fields.last_name,
        VALIDATION_LASTNAME_REQUIRED,
        "Please enter Lastname.",
        "last_name",
    )?;
    require(
        &fields.gender,
        VALIDATION_GENDER_REQUIRED,
        "Please select Gender.",
        "gender",
    )?;
    validate_age(&fields.age)?;
    require(
        &fields.address,
        VALIDATION_ADDRESS_REQUIRED,
        "Please enter Address.",
        "address",
    )?;
    validate_contact(&fields.contact)?;

    Ok(fields)
}
