//! Submitter address checks: syntax, allow-list and deny-list.

use lettre::message::Mailbox;
use regex::Regex;
use thiserror::Error;

use crate::config::ModerationConfig;
use crate::{BoerseError, Result};

/// Why an address was not accepted for automatic verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The address cannot be parsed.
    #[error("{0}")]
    MalformedAddress(String),

    /// The address is well-formed but matches no allow-list pattern.
    #[error("E-Mail ist nicht auf der Liste der zulässigen Adressen bzw. Einrichtungen.")]
    UnknownAddress,
}

/// Compiled allow- and deny-lists.
#[derive(Debug, Clone, Default)]
pub struct AddressPolicy {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

fn compile_all(patterns: &[String], list: &str) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| {
                BoerseError::Config(format!("invalid {list} mail pattern {p:?}: {e}"))
            })
        })
        .collect()
}

impl AddressPolicy {
    /// Compile the policy from raw patterns.
    pub fn new(allow: &[String], deny: &[String]) -> Result<Self> {
        Ok(Self {
            allow: compile_all(allow, "valid")?,
            deny: compile_all(deny, "forbidden")?,
        })
    }

    /// Compile the policy from the moderation config section.
    pub fn from_config(config: &ModerationConfig) -> Result<Self> {
        Self::new(&config.valid_mail_regexp, &config.forbidden_mail_regexp)
    }

    /// Check syntax and allow-list membership.
    ///
    /// An empty allow-list accepts every well-formed address. Patterns are
    /// searched anywhere in the address, so anchors must be written into
    /// the pattern.
    pub fn validate(&self, email: &str) -> std::result::Result<(), AddressError> {
        email
            .parse::<Mailbox>()
            .map_err(|e| AddressError::MalformedAddress(e.to_string()))?;

        if self.allow.is_empty() || self.allow.iter().any(|r| r.is_match(email)) {
            Ok(())
        } else {
            Err(AddressError::UnknownAddress)
        }
    }

    /// Whether the address matches any deny-list pattern.
    pub fn is_forbidden(&self, email: &str) -> bool {
        self.deny.iter().any(|r| r.is_match(email))
    }
}
