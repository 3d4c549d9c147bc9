//! Field validation for posting submissions and edits.
//!
//! Messages are shown verbatim on the form, in German.

use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

/// Maximum length of short text fields, in characters.
pub const MAX_FIELD_CHARS: usize = 500;

/// Maximum length of the description, in characters.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Upper bound of the expected duration in months.
pub const MAX_REQUIRED_MONTHS: i64 = 120;

/// Order in which field errors are reported (the order of the form).
pub const FIELD_ORDER: &[&str] = &[
    "email",
    "title",
    "institute",
    "advisor",
    "supervisor",
    "audience",
    "category",
    "posting_type",
    "degree",
    "start",
    "required_months",
    "required_effort",
    "text",
];

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The user-editable fields of a posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct PostingFields {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(
        max = 500,
        message = "Das Angabe \"Institut\" darf maximal 500 Zeichen lang sein."
    ))]
    pub institute: String,
    #[validate(length(
        max = 500,
        message = "Die Angabe \"Betreuerin / Betreuer\" darf maximal 500 Zeichen lang sein."
    ))]
    pub advisor: String,
    #[validate(length(
        max = 500,
        message = "Die Angabe \"Doktormutter / Doktorvater\" darf maximal 500 Zeichen lang sein."
    ))]
    pub supervisor: String,
    #[validate(length(
        max = 500,
        message = "Die Angabe \"Für Studierende der Fächer ...\" darf maximal 500 Zeichen lang sein."
    ))]
    pub audience: String,
    #[validate(length(
        max = 500,
        message = "Die Angabe \"Art\" darf maximal 500 Zeichen lang sein."
    ))]
    pub category: String,
    #[validate(length(
        max = 500,
        message = "Die Angabe \"Typ\" darf maximal 500 Zeichen lang sein."
    ))]
    pub posting_type: String,
    #[validate(length(
        max = 500,
        message = "Die Angabe \"Abschluss\" darf maximal 500 Zeichen lang sein."
    ))]
    pub degree: String,
    #[validate(length(
        max = 500,
        message = "Die Angabe \"Start\" darf maximal 500 Zeichen lang sein."
    ))]
    pub start: String,
    #[validate(range(
        min = 0,
        max = 120,
        message = "Die Angabe \"Voraussichtliche Dauer in Monaten\" muss zwischen 0 und 120 Monaten liegen."
    ))]
    pub required_months: i64,
    #[validate(length(
        max = 500,
        message = "Die Angabe \"Ungefährer Arbeitsaufwand\" darf maximal 500 Zeichen lang sein."
    ))]
    pub required_effort: String,
    #[validate(custom(function = "validate_text"))]
    pub text: String,
}

fn required_with_max(
    value: &str,
    max: usize,
    missing: &'static str,
    too_long: &'static str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed(missing)));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new("length").with_message(Cow::Borrowed(too_long)));
    }
    Ok(())
}

fn validate_title(value: &str) -> Result<(), ValidationError> {
    required_with_max(
        value,
        MAX_FIELD_CHARS,
        "Ein Titel ist erforderlich.",
        "Der \"Titel\" darf maximal 500 Zeichen lang sein.",
    )
}

fn validate_text(value: &str) -> Result<(), ValidationError> {
    required_with_max(
        value,
        MAX_TEXT_CHARS,
        "Eine Beschreibung ist erforderlich.",
        "Die \"Beschreibung\" darf maximal 10000 Zeichen lang sein.",
    )
}

/// Message for a duration that is not a whole number.
pub const REQUIRED_MONTHS_NOT_A_NUMBER: &str =
    "Die Angabe \"Voraussichtliche Dauer in Monaten\" muss eine ganze Zahl sein.";

/// Message for a syntactically invalid submitter address.
pub fn malformed_email_message(detail: &str) -> String {
    format!("Ungültige E-Mail Adresse ({detail:?})")
}

fn field_rank(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|f| *f == field)
        .unwrap_or(FIELD_ORDER.len())
}

/// Sort field errors into form order.
pub fn sort_field_errors(errors: &mut [FieldError]) {
    errors.sort_by_key(|e| field_rank(&e.field));
}

/// Flatten validator output into ordered field errors.
pub fn from_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for e in field_errors.iter() {
            let message = e
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Ungültige Angabe \"{field}\"."));
            out.push(FieldError::new(field.to_string(), message));
        }
    }
    sort_field_errors(&mut out);
    out
}

impl PostingFields {
    /// Validate every field, returning all violations in form order.
    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        match self.validate() {
            Ok(()) => Ok(()),
            Err(errors) => Err(from_validation_errors(&errors)),
        }
    }
}
