//! Middleware for the web layer.

pub mod error_page;
pub mod security;

pub use error_page::render_error_page;
pub use security::security_headers;
