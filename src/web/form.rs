//! Submission and edit form decoding.

use serde::Deserialize;

use crate::moderation::Submission;
use crate::posting::{FieldError, Posting, PostingFields, REQUIRED_MONTHS_NOT_A_NUMBER};

/// Raw form fields, as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostingForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub institute: String,
    #[serde(default)]
    pub advisor: String,
    #[serde(default)]
    pub supervisor: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, rename = "type")]
    pub posting_type: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub start: String,
    #[serde(default, rename = "required-months")]
    pub required_months: String,
    #[serde(default, rename = "required-effort")]
    pub required_effort: String,
    #[serde(default)]
    pub text: String,
}

/// Parse the duration field. An empty field means 0 months.
pub fn parse_required_months(raw: &str) -> Result<i64, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i64>()
        .map_err(|_| FieldError::new("required_months", REQUIRED_MONTHS_NOT_A_NUMBER))
}

impl PostingForm {
    /// Prefill the form from a stored posting.
    pub fn from_posting(posting: &Posting) -> Self {
        let f = &posting.fields;
        Self {
            email: posting.email.clone(),
            title: f.title.clone(),
            institute: f.institute.clone(),
            advisor: f.advisor.clone(),
            supervisor: f.supervisor.clone(),
            audience: f.audience.clone(),
            category: f.category.clone(),
            posting_type: f.posting_type.clone(),
            degree: f.degree.clone(),
            start: f.start.clone(),
            required_months: f.required_months.to_string(),
            required_effort: f.required_effort.clone(),
            text: f.text.clone(),
        }
    }

    /// Decode into posting fields plus any decoding errors.
    pub fn to_fields(&self) -> (PostingFields, Vec<FieldError>) {
        let mut errors = Vec::new();
        let required_months = parse_required_months(&self.required_months).unwrap_or_else(|e| {
            errors.push(e);
            0
        });

        let fields = PostingFields {
            title: self.title.clone(),
            institute: self.institute.clone(),
            advisor: self.advisor.clone(),
            supervisor: self.supervisor.clone(),
            audience: self.audience.clone(),
            category: self.category.clone(),
            posting_type: self.posting_type.clone(),
            degree: self.degree.clone(),
            start: self.start.clone(),
            required_months,
            required_effort: self.required_effort.clone(),
            text: self.text.clone(),
        };
        (fields, errors)
    }

    /// Decode into a submission.
    pub fn to_submission(&self) -> Submission {
        let (fields, form_errors) = self.to_fields();
        Submission {
            email: self.email.clone(),
            fields,
            form_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_required_months() {
        assert_eq!(parse_required_months("12"), Ok(12));
        assert_eq!(parse_required_months(" 0 "), Ok(0));
        assert_eq!(parse_required_months(""), Ok(0));
        assert_eq!(parse_required_months("-1"), Ok(-1));

        let err = parse_required_months("zwölf").unwrap_err();
        assert_eq!(err.field, "required_months");
        assert_eq!(err.message, REQUIRED_MONTHS_NOT_A_NUMBER);
    }

    #[test]
    fn test_to_submission_collects_decoding_errors() {
        let form = PostingForm {
            email: "anna@uni.example".to_string(),
            title: "Thema".to_string(),
            required_months: "viele".to_string(),
            text: "Text".to_string(),
            ..Default::default()
        };
        let submission = form.to_submission();
        assert_eq!(submission.email, "anna@uni.example");
        assert_eq!(submission.fields.title, "Thema");
        assert_eq!(submission.fields.required_months, 0);
        assert_eq!(submission.form_errors.len(), 1);
    }

    #[test]
    fn test_field_names_match_html() {
        let form: PostingForm = decode(&[
            ("type", "Praktikum"),
            ("required-months", "6"),
            ("required-effort", "20h/Woche"),
        ]);
        assert_eq!(form.posting_type, "Praktikum");
        assert_eq!(form.required_months, "6");
        assert_eq!(form.required_effort, "20h/Woche");
    }

    // Deserialize through the same serde attributes the form extractor uses.
    fn decode(pairs: &[(&str, &str)]) -> PostingForm {
        let table: toml::Table = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), toml::Value::String(v.to_string())))
            .collect();
        toml::Value::Table(table).try_into().unwrap()
    }
}
