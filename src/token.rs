//! Capability token generation.
//!
//! Tokens are bearer secrets delivered by mail: whoever holds a posting's
//! admin token may edit, preview and delete it, whoever holds its verify
//! token may publish it.

use rand::rngs::OsRng;
use rand::{RngCore, TryRngCore};

/// Number of random bytes in a capability token.
pub const TOKEN_BYTES: usize = 30;

/// Number of random bytes in a cookie signing secret.
pub const COOKIE_SECRET_BYTES: usize = 64;

fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    // A failing OS RNG leaves no safe way to continue, so `unwrap_err` panics.
    OsRng.unwrap_err().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Generate a new capability token (60 lowercase hex characters).
pub fn generate_token() -> String {
    random_hex(TOKEN_BYTES)
}

/// Generate a hex-encoded key for signing cookies.
pub fn generate_cookie_secret() -> String {
    random_hex(COOKIE_SECRET_BYTES)
}

/// Compare two tokens in time independent of where they differ.
pub fn tokens_match(expected: &str, supplied: &str) -> bool {
    let a = expected.as_bytes();
    let b = supplied.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
