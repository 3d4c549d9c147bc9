//! Notification mails.
//!
//! [`Notifier`] renders the embedded mail templates for a posting and hands
//! the result to an [`EmailSender`]. Production uses [`SmtpSender`]; tests
//! use [`MemorySender`].

mod sender;
mod templates;

pub use sender::{EmailSender, MemorySender, OutgoingEmail, SmtpSender};
pub use templates::{split_subject, MailKind};

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::datetime::format_datetime_default;
use crate::posting::Posting;
use crate::template::{TemplateContext, TemplateEngine};
use crate::Result;

/// Capability links of a posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingLinks {
    pub public: String,
    pub preview: String,
    pub verify: String,
    pub admin: String,
}

impl PostingLinks {
    /// Build the links from the site base URL (without trailing slash).
    pub fn new(base_url: &str, posting: &Posting) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            public: format!("{base}/{}", posting.uuid),
            preview: format!("{base}/{}/{}/preview", posting.uuid, posting.admin_token),
            verify: format!("{base}/{}/{}/verify", posting.uuid, posting.verify_token),
            admin: format!("{base}/{}/{}/admin", posting.uuid, posting.admin_token),
        }
    }
}

/// Collapse line breaks and runs of whitespace; the subject is the first
/// rendered line.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Renders and dispatches notification mails.
pub struct Notifier {
    engine: TemplateEngine,
    sender: Arc<dyn EmailSender>,
    from: String,
    admin_email: String,
    base_url: String,
    timezone: String,
}

impl Notifier {
    /// Create a notifier; fails if a mail template does not parse.
    pub fn new(config: &Config, sender: Arc<dyn EmailSender>) -> Result<Self> {
        Ok(Self {
            engine: templates::load_engine()?,
            sender,
            from: config.mail.mail_from.clone(),
            admin_email: config.mail.admin_email.clone(),
            base_url: config.site.base_url().to_string(),
            timezone: config.server.timezone.clone(),
        })
    }

    /// Links for a posting.
    pub fn links(&self, posting: &Posting) -> PostingLinks {
        PostingLinks::new(&self.base_url, posting)
    }

    fn recipient(&self, kind: MailKind, posting: &Posting) -> String {
        match kind {
            MailKind::AdminReviewRequest => self.admin_email.clone(),
            MailKind::UserPendingReview | MailKind::UserAutoVerified => posting.email.clone(),
        }
    }

    /// Render a mail without sending it.
    pub fn compose(
        &self,
        kind: MailKind,
        posting: &Posting,
        reminder: bool,
    ) -> Result<OutgoingEmail> {
        let links = self.links(posting);
        let context = TemplateContext::new()
            .with("uuid", &posting.uuid)
            .with("title", single_line(&posting.fields.title))
            .with("email", &posting.email)
            .with(
                "created_at",
                format_datetime_default(&posting.created_at, &self.timezone),
            )
            .with("public_link", links.public)
            .with("preview_link", links.preview)
            .with("verify_link", links.verify)
            .with("admin_link", links.admin)
            .with("reminder", reminder);

        let rendered = self.engine.render(kind.as_str(), &context)?;
        let (subject, body) = split_subject(&rendered)?;

        Ok(OutgoingEmail {
            from: self.from.clone(),
            to: self.recipient(kind, posting),
            subject,
            body,
        })
    }

    /// Render and deliver one mail.
    pub async fn send(&self, kind: MailKind, posting: &Posting, reminder: bool) -> Result<()> {
        let email = self.compose(kind, posting, reminder)?;
        self.sender.send(&email).await?;
        info!(
            posting = %posting.uuid,
            template = kind.as_str(),
            reminder,
            "notification sent"
        );
        Ok(())
    }

    /// Mails for a freshly submitted posting.
    ///
    /// With admin review: the review request to the admin, then the
    /// pending-review notice to the submitter. Otherwise only the
    /// verification mail to the submitter. Stops at the first failure.
    pub async fn notify_submitted(&self, posting: &Posting) -> Result<()> {
        if posting.requires_admin_review {
            self.send(MailKind::AdminReviewRequest, posting, false).await?;
            self.send(MailKind::UserPendingReview, posting, false).await
        } else {
            self.send(MailKind::UserAutoVerified, posting, false).await
        }
    }

    /// Re-send the mail that unblocks a pending posting.
    pub async fn send_reminder(&self, posting: &Posting) -> Result<MailKind> {
        let kind = if posting.requires_admin_review {
            MailKind::AdminReviewRequest
        } else {
            MailKind::UserAutoVerified
        };
        self.send(kind, posting, true).await?;
        Ok(kind)
    }
}
