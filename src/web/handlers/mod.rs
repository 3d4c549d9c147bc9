//! Page handlers.

pub mod admin;
pub mod public;
pub mod submit;

pub use admin::*;
pub use public::*;
pub use submit::*;
