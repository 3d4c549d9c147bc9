//! Boerse - research project exchange
//!
//! A small web application for submitting and browsing thesis and research
//! project postings. Postings are published after the submitter clicks an
//! emailed verification link, or after an admin approves them when the
//! submitter address is not on the allow-list. Every posting carries two
//! secret tokens that act as bearer capabilities for moderation.

pub mod config;
pub mod context;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod moderation;
pub mod notify;
pub mod posting;
pub mod template;
pub mod token;
pub mod web;

pub use config::Config;
pub use context::AppContext;
pub use db::Database;
pub use error::{BoerseError, Result};
pub use moderation::{AddressPolicy, Janitor, ModerationService};
pub use posting::{Posting, PostingFields, PostingRepository};
