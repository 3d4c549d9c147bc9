//! Common test utilities for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::{TestResponse, TestServer};
use boerse::notify::{MemorySender, OutgoingEmail};
use boerse::token::generate_cookie_secret;
use boerse::web::{create_router, AppState};
use boerse::{AppContext, Config, Database, Posting};
use regex::Regex;

/// Base URL used in mail links.
pub const BASE_URL: &str = "http://boerse.test";
/// Address receiving admin review requests.
pub const ADMIN_EMAIL: &str = "admin@boerse.test";
/// Delay for deny-listed submissions in tests.
pub const DENY_DELAY_MS: u64 = 300;

/// An address on the allow-list.
pub const KNOWN: &str = "anna@uni.example";
/// An address on neither list.
pub const UNKNOWN: &str = "bert@mail.example";
/// An address on the deny-list.
pub const FORBIDDEN: &str = "eve@spam.example";

/// Create a test configuration.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.site.url = format!("{BASE_URL}/");
    config.site.cookie_secret = generate_cookie_secret();
    config.site.info_text = "Angebote für **Abschlussarbeiten**.".to_string();
    config.mail.mail_from = "boerse@boerse.test".to_string();
    config.mail.admin_email = ADMIN_EMAIL.to_string();
    config.moderation.valid_mail_regexp = vec![r"@uni\.example$".to_string()];
    config.moderation.forbidden_mail_regexp = vec![r"@spam\.example$".to_string()];
    config.moderation.deny_delay_ms = DENY_DELAY_MS;
    config.server.timezone = "UTC".to_string();
    config
}

/// A router on an in-memory database with a recording outbox.
pub struct TestApp {
    pub server: TestServer,
    pub ctx: Arc<AppContext>,
    pub outbox: Arc<MemorySender>,
}

impl TestApp {
    /// Create a test app with the default test configuration.
    pub async fn new() -> Self {
        Self::with_config(create_test_config()).await
    }

    /// Create a test app with a custom configuration.
    pub async fn with_config(config: Config) -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let outbox = Arc::new(MemorySender::new());
        let ctx = Arc::new(
            AppContext::new(config, db, outbox.clone()).expect("Failed to create app context"),
        );
        let state = AppState::new(ctx.clone()).expect("Failed to create app state");
        let server = TestServer::new(create_router(state)).expect("Failed to create test server");

        Self {
            server,
            ctx,
            outbox,
        }
    }

    /// Post the submission form.
    pub async fn submit(&self, fields: &[(&str, String)]) -> TestResponse {
        self.server.post("/new").form(&fields).await
    }

    /// Submit a valid posting.
    pub async fn submit_valid(&self, email: &str, title: &str) -> TestResponse {
        self.submit(&form(email, title)).await
    }

    /// Load a stored posting by title.
    pub async fn stored(&self, title: &str) -> Posting {
        let uuid: String = sqlx::query_scalar("SELECT uuid FROM postings WHERE title = $1")
            .bind(title)
            .fetch_one(self.ctx.db.pool())
            .await
            .expect("posting not stored");
        self.ctx
            .postings()
            .get_by_uuid(&uuid)
            .await
            .unwrap()
            .unwrap()
    }

    /// Number of stored postings, deleted ones included.
    pub async fn count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM postings")
            .fetch_one(self.ctx.db.pool())
            .await
            .unwrap()
    }

    /// Mails delivered to `to`.
    pub fn mails_to(&self, to: &str) -> Vec<OutgoingEmail> {
        self.outbox.sent_to(to)
    }
}

/// A valid form for the given sender and title.
pub fn form(email: &str, title: &str) -> Vec<(&'static str, String)> {
    vec![
        ("email", email.to_string()),
        ("title", title.to_string()),
        ("institute", "Institut für Zellbiologie".to_string()),
        ("advisor", "Dr. Beispiel".to_string()),
        ("supervisor", String::new()),
        ("audience", "Biologie, Biochemie".to_string()),
        ("category", "Masterarbeit".to_string()),
        ("type", "Experimentell".to_string()),
        ("degree", "M.Sc.".to_string()),
        ("start", "ab sofort".to_string()),
        ("required-months", "6".to_string()),
        ("required-effort", "Vollzeit".to_string()),
        ("text", "Beschreibung des Projekts.\nZweite Zeile.".to_string()),
    ]
}

/// Replace one field of a form.
pub fn with_field(
    mut fields: Vec<(&'static str, String)>,
    name: &str,
    value: impl Into<String>,
) -> Vec<(&'static str, String)> {
    let value = value.into();
    for (key, v) in fields.iter_mut() {
        if *key == name {
            *v = value.clone();
        }
    }
    fields
}

/// Extract the path of the first link ending in `/{action}` from a mail.
pub fn link_path(mail: &OutgoingEmail, action: &str) -> String {
    let re = Regex::new(&format!(r"{}(/\S+/{action})", regex::escape(BASE_URL))).unwrap();
    re.captures(&mail.body)
        .unwrap_or_else(|| panic!("no {action} link in mail:\n{}", mail.body))[1]
        .to_string()
}
