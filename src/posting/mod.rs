//! Postings: types, field validation and persistence.

mod repository;
mod types;
mod validation;

pub use repository::{PostingRepository, FEED_LIMIT};
pub use types::{ModerationState, NewPosting, Posting, PostingSummary};
pub use validation::{
    from_validation_errors, malformed_email_message, sort_field_errors, FieldError,
    PostingFields, FIELD_ORDER, MAX_FIELD_CHARS, MAX_REQUIRED_MONTHS, MAX_TEXT_CHARS,
    REQUIRED_MONTHS_NOT_A_NUMBER,
};
