//! Embedded mail templates.
//!
//! The first line of a rendered template is the subject; the body starts
//! after the blank line that follows.

use crate::template::{EscapeMode, TemplateEngine};
use crate::{BoerseError, Result};

/// The notification mails the service sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    /// To the admin: a posting from an unknown address needs review.
    AdminReviewRequest,
    /// To the submitter: the posting waits for an admin.
    UserPendingReview,
    /// To the submitter: please click the verification link.
    UserAutoVerified,
}

impl MailKind {
    /// Template name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MailKind::AdminReviewRequest => "admin-review-request",
            MailKind::UserPendingReview => "user-pending-review",
            MailKind::UserAutoVerified => "user-auto-verified",
        }
    }
}

const SOURCES: &[(&str, &str)] = &[
    (
        "admin-review-request",
        include_str!("../../templates/mail/admin-review-request.txt"),
    ),
    (
        "user-pending-review",
        include_str!("../../templates/mail/user-pending-review.txt"),
    ),
    (
        "user-auto-verified",
        include_str!("../../templates/mail/user-auto-verified.txt"),
    ),
];

/// Parse all mail templates into a plain-text engine.
pub fn load_engine() -> Result<TemplateEngine> {
    let mut engine = TemplateEngine::new(EscapeMode::None);
    engine.load_all(SOURCES)?;
    Ok(engine)
}

/// Split rendered output into subject and body.
pub fn split_subject(rendered: &str) -> Result<(String, String)> {
    let (subject, body) = rendered.split_once('\n').unwrap_or((rendered, ""));
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(BoerseError::Internal(
            "mail template rendered an empty subject".to_string(),
        ));
    }
    Ok((subject.to_string(), body.trim_start_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_parse() {
        let engine = load_engine().unwrap();
        for kind in [
            MailKind::AdminReviewRequest,
            MailKind::UserPendingReview,
            MailKind::UserAutoVerified,
        ] {
            assert!(engine.has_template(kind.as_str()), "{}", kind.as_str());
        }
    }

    #[test]
    fn test_split_subject() {
        let (subject, body) = split_subject("Betreff\n\nZeile 1\nZeile 2\n").unwrap();
        assert_eq!(subject, "Betreff");
        assert_eq!(body, "Zeile 1\nZeile 2\n");
    }

    #[test]
    fn test_split_subject_without_body() {
        let (subject, body) = split_subject("Nur Betreff").unwrap();
        assert_eq!(subject, "Nur Betreff");
        assert_eq!(body, "");
    }

    #[test]
    fn test_split_subject_empty() {
        assert!(split_subject("\nBody").is_err());
    }
}
