//! Web interface.
//!
//! Server-rendered pages for browsing and submitting postings plus the
//! token-protected moderation routes and the RSS feed.

pub mod error;
pub mod flash;
pub mod form;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod router;
pub mod server;
pub mod state;

pub use error::WebError;
pub use router::create_router;
pub use server::WebServer;
pub use state::AppState;
