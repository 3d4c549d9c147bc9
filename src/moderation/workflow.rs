//! Moderation workflow: submit, verify, edit, delete and view postings.
//!
//! Authorization is possession of a token: the verify token unlocks
//! verification, the admin token unlocks preview, edit and delete. The
//! admin token never verifies: submitters awaiting review hold it.

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::context::AppContext;
use crate::posting::{
    malformed_email_message, sort_field_errors, FieldError, NewPosting, Posting, PostingFields,
};
use crate::token::{generate_token, tokens_match};
use crate::{BoerseError, Result};

use super::address::AddressError;

/// A submission as received from the form.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Submitter address.
    pub email: String,
    /// Posting content.
    pub fields: PostingFields,
    /// Errors found while decoding the form (e.g. a non-numeric duration).
    pub form_errors: Vec<FieldError>,
}

/// Normalize a public posting id; anything that is not a UUID is unknown.
pub fn normalize_id(id: &str) -> Result<String> {
    Uuid::parse_str(id)
        .map(|u| u.hyphenated().to_string())
        .map_err(|_| BoerseError::NotFound("posting".to_string()))
}

/// Moderation operations bound to an application context.
pub struct ModerationService<'a> {
    ctx: &'a AppContext,
}

impl<'a> ModerationService<'a> {
    /// Create a new service.
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    async fn load(&self, id: &str) -> Result<Posting> {
        let uuid = normalize_id(id)?;
        self.ctx
            .postings()
            .get_by_uuid(&uuid)
            .await?
            .ok_or_else(|| BoerseError::NotFound("posting".to_string()))
    }

    fn check_admin(posting: &Posting, token: &str) -> Result<()> {
        if tokens_match(&posting.admin_token, token) {
            Ok(())
        } else {
            warn!(posting = %posting.uuid, "invalid admin token");
            Err(BoerseError::Forbidden("invalid admin token".to_string()))
        }
    }

    /// Submit a new posting.
    ///
    /// Deny-listed senders are answered after the configured delay with
    /// [`BoerseError::DenyListed`] and nothing is stored. Unknown senders
    /// are stored with `requires_admin_review`. All field violations are
    /// reported together. Mails are sent after the posting is stored; a
    /// delivery failure is returned but the posting stays.
    pub async fn submit(&self, submission: Submission) -> Result<Posting> {
        let email = submission.email.trim().to_string();

        if self.ctx.policy.is_forbidden(&email) {
            warn!(email = %email, "submission from forbidden address rejected");
            tokio::time::sleep(self.ctx.deny_delay()).await;
            return Err(BoerseError::DenyListed);
        }

        let mut errors = submission.form_errors;
        let requires_admin_review = match self.ctx.policy.validate(&email) {
            Ok(()) => false,
            Err(AddressError::UnknownAddress) => true,
            Err(AddressError::MalformedAddress(detail)) => {
                errors.push(FieldError::new("email", malformed_email_message(&detail)));
                false
            }
        };

        if let Err(field_errors) = submission.fields.check() {
            errors.extend(field_errors);
        }
        if !errors.is_empty() {
            sort_field_errors(&mut errors);
            return Err(BoerseError::Validation(errors));
        }

        let new_posting = NewPosting {
            uuid: Uuid::new_v4().to_string(),
            admin_token: generate_token(),
            verify_token: generate_token(),
            email,
            fields: submission.fields,
            requires_admin_review,
        };
        let posting = self.ctx.postings().create(&new_posting).await?;

        info!(
            posting = %posting.uuid,
            state = %posting.state(),
            "posting submitted"
        );

        if let Err(e) = self.ctx.notifier.notify_submitted(&posting).await {
            error!(posting = %posting.uuid, error = %e, "failed to send submission mails");
            return Err(e);
        }

        Ok(posting)
    }

    /// Verify a posting with its verify token.
    ///
    /// Not single-use: verifying again re-stamps `last_verified_at`.
    pub async fn verify(&self, id: &str, token: &str) -> Result<Posting> {
        let posting = self.load(id).await?;
        if posting.deleted {
            return Err(BoerseError::NotFound("posting".to_string()));
        }

        if !tokens_match(&posting.verify_token, token) {
            warn!(posting = %posting.uuid, "invalid verify token");
            return Err(BoerseError::Forbidden("invalid verify token".to_string()));
        }

        self.ctx.postings().mark_verified(&posting.uuid).await?;
        info!(posting = %posting.uuid, "posting verified");

        self.load(&posting.uuid).await
    }

    /// Load an undeleted posting for editing.
    pub async fn get_for_edit(&self, id: &str, token: &str) -> Result<Posting> {
        let posting = self.load(id).await?;
        if posting.deleted {
            return Err(BoerseError::NotFound("posting".to_string()));
        }
        Self::check_admin(&posting, token)?;
        Ok(posting)
    }

    /// Overwrite the editable fields. The submitter address never changes.
    pub async fn edit(
        &self,
        id: &str,
        token: &str,
        fields: PostingFields,
        form_errors: Vec<FieldError>,
    ) -> Result<Posting> {
        let posting = self.get_for_edit(id, token).await?;

        let mut errors = form_errors;
        if let Err(field_errors) = fields.check() {
            errors.extend(field_errors);
        }
        if !errors.is_empty() {
            sort_field_errors(&mut errors);
            return Err(BoerseError::Validation(errors));
        }

        if !self.ctx.postings().update_fields(&posting.uuid, &fields).await? {
            // Deleted between the check and the update.
            return Err(BoerseError::NotFound("posting".to_string()));
        }
        info!(posting = %posting.uuid, "posting updated");

        self.load(&posting.uuid).await
    }

    /// Soft-delete a posting. Deleting twice is harmless.
    pub async fn delete(&self, id: &str, token: &str) -> Result<()> {
        let posting = self.load(id).await?;
        Self::check_admin(&posting, token)?;

        self.ctx.postings().soft_delete(&posting.uuid).await?;
        info!(posting = %posting.uuid, "posting deleted");
        Ok(())
    }

    /// Load a posting for display.
    ///
    /// Verified postings are public. Unverified ones need the admin token
    /// (otherwise `Forbidden`); deleted ones are only shown with the admin
    /// token (otherwise `NotFound`).
    pub async fn view(&self, id: &str, token: Option<&str>) -> Result<Posting> {
        let posting = self.load(id).await?;
        let has_admin = token
            .map(|t| tokens_match(&posting.admin_token, t))
            .unwrap_or(false);

        if posting.deleted {
            if has_admin {
                return Ok(posting);
            }
            return Err(BoerseError::NotFound("posting".to_string()));
        }

        if !posting.verified && !has_admin {
            if token.is_some() {
                warn!(posting = %posting.uuid, "invalid admin token");
            }
            return Err(BoerseError::Forbidden(
                "posting is not verified".to_string(),
            ));
        }

        Ok(posting)
    }
}
