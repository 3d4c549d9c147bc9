//! Posting moderation.
//!
//! - [`address`]: allow/deny lists for submitter addresses
//! - [`workflow`]: submit, verify, edit, delete, view
//! - [`janitor`]: reminder re-sends for pending postings

pub mod address;
pub mod janitor;
pub mod workflow;

pub use address::{AddressError, AddressPolicy};
pub use janitor::{run_once, Janitor, ReminderReport};
pub use workflow::{normalize_id, ModerationService, Submission};
