//! Posting types.

use super::validation::PostingFields;

/// Moderation state derived from the stored flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationState {
    /// Waiting for the submitter to click the verification link.
    PendingVerification,
    /// Waiting for an administrator; the submitter address is not allow-listed.
    PendingAdminReview,
    /// Publicly visible.
    Verified,
    /// Soft-deleted; terminal.
    Deleted,
}

impl ModerationState {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationState::PendingVerification => "pending-verification",
            ModerationState::PendingAdminReview => "pending-admin-review",
            ModerationState::Verified => "verified",
            ModerationState::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ModerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored posting.
#[derive(Debug, Clone)]
pub struct Posting {
    /// Internal row id; only used to break ordering ties.
    pub id: i64,
    /// Public identifier (UUID v4).
    pub uuid: String,
    /// Token granting edit, preview and delete.
    pub admin_token: String,
    /// Token granting verification.
    pub verify_token: String,
    /// Submitter address.
    pub email: String,
    /// User-editable content.
    pub fields: PostingFields,
    pub verified: bool,
    pub deleted: bool,
    pub requires_admin_review: bool,
    /// Creation time (UTC, `YYYY-MM-DD HH:MM:SS`).
    pub created_at: String,
    pub last_updated_at: Option<String>,
    pub last_verified_at: Option<String>,
    pub last_reminded_at: Option<String>,
    pub reminder_count: i64,
}

impl Posting {
    /// Current moderation state.
    pub fn state(&self) -> ModerationState {
        if self.deleted {
            ModerationState::Deleted
        } else if self.verified {
            ModerationState::Verified
        } else if self.requires_admin_review {
            ModerationState::PendingAdminReview
        } else {
            ModerationState::PendingVerification
        }
    }

    /// Whether the posting is visible without a token.
    pub fn is_public(&self) -> bool {
        self.state() == ModerationState::Verified
    }
}

/// Data for inserting a posting.
#[derive(Debug, Clone)]
pub struct NewPosting {
    pub uuid: String,
    pub admin_token: String,
    pub verify_token: String,
    pub email: String,
    pub fields: PostingFields,
    pub requires_admin_review: bool,
}

/// Listing and feed entry.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PostingSummary {
    pub uuid: String,
    pub created_at: String,
    pub category: String,
    pub posting_type: String,
    pub title: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> Posting {
        Posting {
            id: 1,
            uuid: "u".to_string(),
            admin_token: "a".to_string(),
            verify_token: "v".to_string(),
            email: "x@example.org".to_string(),
            fields: PostingFields::default(),
            verified: false,
            deleted: false,
            requires_admin_review: false,
            created_at: "2024-01-01 00:00:00".to_string(),
            last_updated_at: None,
            last_verified_at: None,
            last_reminded_at: None,
            reminder_count: 0,
        }
    }

    #[test]
    fn test_state_derivation() {
        let mut p = posting();
        assert_eq!(p.state(), ModerationState::PendingVerification);
        assert!(!p.is_public());

        p.requires_admin_review = true;
        assert_eq!(p.state(), ModerationState::PendingAdminReview);

        p.verified = true;
        assert_eq!(p.state(), ModerationState::Verified);
        assert!(p.is_public());

        p.deleted = true;
        assert_eq!(p.state(), ModerationState::Deleted);
        assert!(!p.is_public());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ModerationState::PendingAdminReview.to_string(), "pending-admin-review");
        assert_eq!(ModerationState::Deleted.as_str(), "deleted");
    }
}
