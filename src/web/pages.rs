//! HTML pages and the RSS feed.
//!
//! Content templates are rendered first and then embedded into the
//! layout as `{{{content}}}`. The feed is rendered standalone.

use pulldown_cmark::{html, Parser};

use crate::config::Config;
use crate::datetime::{format_datetime_default, to_rfc2822};
use crate::posting::{FieldError, ModerationState, Posting, PostingSummary};
use crate::template::{html_escape, EscapeMode, TemplateContext, TemplateEngine, Value};
use crate::Result;

use super::form::PostingForm;

/// Version shown in the footer.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Characters of the description shown on the index page.
pub const EXCERPT_CHARS: usize = 300;

const SOURCES: &[(&str, &str)] = &[
    ("layout", include_str!("../../templates/pages/layout.html")),
    ("index", include_str!("../../templates/pages/index.html")),
    ("posting", include_str!("../../templates/pages/posting.html")),
    ("form", include_str!("../../templates/pages/form.html")),
    ("error", include_str!("../../templates/pages/error.html")),
    ("feed", include_str!("../../templates/pages/feed.xml")),
];

/// Render markdown to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, Parser::new(markdown));
    out
}

/// Escape text and turn line breaks into `<br>`.
pub fn nl2br(text: &str) -> String {
    html_escape(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// First `max_chars` characters, with an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

/// German label of a moderation state.
pub fn state_label(state: ModerationState) -> &'static str {
    match state {
        ModerationState::PendingVerification => "Wartet auf Verifizierung",
        ModerationState::PendingAdminReview => "Wartet auf Freischaltung",
        ModerationState::Verified => "Freigeschaltet",
        ModerationState::Deleted => "Gelöscht",
    }
}

/// Error pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPage {
    NotFound,
    Forbidden,
    Internal,
}

impl ErrorPage {
    fn heading(&self) -> &'static str {
        match self {
            ErrorPage::NotFound => "Seite nicht gefunden",
            ErrorPage::Forbidden => "Zugriff verweigert",
            ErrorPage::Internal => "Interner Fehler",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ErrorPage::NotFound => "Das angeforderte Angebot existiert nicht oder wurde gelöscht.",
            ErrorPage::Forbidden => "Der verwendete Link ist ungültig.",
            ErrorPage::Internal => "Bitte versuchen Sie es später noch einmal.",
        }
    }
}

/// A form page being rendered.
#[derive(Debug, Clone, Copy)]
pub struct FormPage<'a> {
    pub form: &'a PostingForm,
    /// `(uuid, admin token)` when editing an existing posting.
    pub edit: Option<(&'a str, &'a str)>,
    pub institutes: &'a [String],
    pub errors: &'a [FieldError],
}

/// Page renderer built from the site configuration.
#[derive(Debug)]
pub struct Pages {
    engine: TemplateEngine,
    title_text: String,
    base_url: String,
    info_html: String,
    footer_html: String,
    categories: Vec<String>,
    types: Vec<String>,
    timezone: String,
}

impl Pages {
    /// Parse the embedded templates and render the markdown texts.
    pub fn new(config: &Config) -> Result<Self> {
        let mut engine = TemplateEngine::new(EscapeMode::Html);
        engine.load_all(SOURCES)?;

        Ok(Self {
            engine,
            title_text: config.site.title_text.clone(),
            base_url: config.site.base_url().to_string(),
            info_html: markdown_to_html(&config.site.info_text),
            footer_html: markdown_to_html(&config.site.footer_text),
            categories: config.site.posting_categories.clone(),
            types: config.site.posting_types.clone(),
            timezone: config.server.timezone.clone(),
        })
    }

    fn base_context(&self, page_title: &str) -> TemplateContext {
        TemplateContext::new()
            .with("title_text", &self.title_text)
            .with("page_title", page_title)
            .with("footer_html", &self.footer_html)
            .with("version", VERSION)
    }

    fn render_page(&self, template: &str, mut context: TemplateContext) -> Result<String> {
        let content = self.engine.render(template, &context)?;
        context.set("content", content);
        Ok(self.engine.render("layout", &context)?)
    }

    fn posting_value(&self, posting: &Posting) -> Value {
        let f = &posting.fields;
        Value::object()
            .field("uuid", &posting.uuid)
            .field("email", &posting.email)
            .field("title", &f.title)
            .field("institute", &f.institute)
            .field("advisor", &f.advisor)
            .field("supervisor", &f.supervisor)
            .field("audience", &f.audience)
            .field("category", &f.category)
            .field("posting_type", &f.posting_type)
            .field("degree", &f.degree)
            .field("start", &f.start)
            .field("required_months", f.required_months)
            .field("required_effort", &f.required_effort)
            .field("verified", posting.verified)
            .field("deleted", posting.deleted)
            .field(
                "created_at",
                format_datetime_default(&posting.created_at, &self.timezone),
            )
            .build()
    }

    /// The public listing.
    pub fn index(&self, postings: &[PostingSummary], flashes: &[String]) -> Result<String> {
        let items: Vec<Value> = postings
            .iter()
            .map(|p| {
                Value::object()
                    .field("uuid", &p.uuid)
                    .field("title", &p.title)
                    .field("category", &p.category)
                    .field("posting_type", &p.posting_type)
                    .field(
                        "created_at",
                        format_datetime_default(&p.created_at, &self.timezone),
                    )
                    .field("excerpt_html", nl2br(&excerpt(&p.text, EXCERPT_CHARS)))
                    .build()
            })
            .collect();

        let context = self
            .base_context("Forschungsarbeitbörse")
            .with("info_html", &self.info_html)
            .with("postings", items)
            .with("flash_messages", flashes.to_vec());
        self.render_page("index", context)
    }

    /// A single posting. `admin_token` adds the moderation controls.
    pub fn posting(
        &self,
        posting: &Posting,
        admin_token: Option<&str>,
        flashes: &[String],
    ) -> Result<String> {
        let context = self
            .base_context(&posting.fields.title)
            .with("posting", self.posting_value(posting))
            .with("text_html", nl2br(&posting.fields.text))
            .with("admin_token", admin_token)
            .with("state_label", state_label(posting.state()))
            .with("flash_messages", flashes.to_vec());
        self.render_page("posting", context)
    }

    fn choices(options: &[String], current: &str) -> Value {
        let mut values: Vec<Value> = options
            .iter()
            .map(|o| {
                Value::object()
                    .field("name", o)
                    .field("selected", o == current)
                    .build()
            })
            .collect();
        // Keep a stored value that is no longer configured selectable.
        if !current.is_empty() && !options.iter().any(|o| o == current) {
            values.push(
                Value::object()
                    .field("name", current)
                    .field("selected", true)
                    .build(),
            );
        }
        Value::List(values)
    }

    /// The submission or edit form.
    pub fn form(&self, page: FormPage<'_>) -> Result<String> {
        let form = page.form;
        let (page_title, action) = match page.edit {
            Some((uuid, token)) => ("Angebot bearbeiten", format!("/{uuid}/{token}/admin")),
            None => ("Neues Angebot", "/new".to_string()),
        };

        let form_value = Value::object()
            .field("email", &form.email)
            .field("title", &form.title)
            .field("institute", &form.institute)
            .field("advisor", &form.advisor)
            .field("supervisor", &form.supervisor)
            .field("audience", &form.audience)
            .field("category", &form.category)
            .field("posting_type", &form.posting_type)
            .field("degree", &form.degree)
            .field("start", &form.start)
            .field("required_months", &form.required_months)
            .field("required_effort", &form.required_effort)
            .field("text", &form.text)
            .build();

        let categories = if self.categories.is_empty() {
            Value::Null
        } else {
            Self::choices(&self.categories, &form.category)
        };
        let types = if self.types.is_empty() {
            Value::Null
        } else {
            Self::choices(&self.types, &form.posting_type)
        };

        let errors: Vec<String> = page.errors.iter().map(|e| e.message.clone()).collect();

        let context = self
            .base_context(page_title)
            .with("form", form_value)
            .with("is_edit", page.edit.is_some())
            .with("action", action)
            .with("categories", categories)
            .with("types", types)
            .with("institutes", page.institutes.to_vec())
            .with("flash_errors", errors);
        self.render_page("form", context)
    }

    /// An error page.
    pub fn error(&self, page: ErrorPage) -> Result<String> {
        let context = self
            .base_context(page.heading())
            .with("heading", page.heading())
            .with("message", page.message());
        self.render_page("error", context)
    }

    /// RSS 2.0 feed of the given postings (newest first).
    pub fn feed(&self, postings: &[PostingSummary]) -> Result<String> {
        let items: Vec<Value> = postings
            .iter()
            .map(|p| {
                Value::object()
                    .field("title", &p.title)
                    .field("uuid", &p.uuid)
                    .field("link", format!("{}/{}", self.base_url, p.uuid))
                    .field("pub_date", to_rfc2822(&p.created_at))
                    .build()
            })
            .collect();
        let pub_date = postings.first().map(|p| to_rfc2822(&p.created_at));

        let context = TemplateContext::new()
            .with("title_text", &self.title_text)
            .with("feed_link", format!("{}/feed", self.base_url))
            .with("pub_date", pub_date)
            .with("items", items);
        Ok(self.engine.render("feed", &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posting::PostingFields;

    fn config() -> Config {
        let mut config = Config::default();
        config.site.url = "https://boerse.example/".to_string();
        config.site.info_text = "Willkommen bei der **Börse**.".to_string();
        config.site.footer_text = "[Impressum](https://example.org/impressum)".to_string();
        config.site.posting_categories = vec!["Bachelorarbeit".to_string(), "Masterarbeit".to_string()];
        config.server.timezone = "UTC".to_string();
        config
    }

    fn posting() -> Posting {
        Posting {
            id: 1,
            uuid: "3f2b8c1e-0000-4000-8000-000000000001".to_string(),
            admin_token: "adm".to_string(),
            verify_token: "ver".to_string(),
            email: "anna@uni.example".to_string(),
            fields: PostingFields {
                title: "Proteine <live>".to_string(),
                institute: "Institut A".to_string(),
                required_months: 6,
                text: "Zeile 1\nZeile <2>".to_string(),
                ..Default::default()
            },
            verified: false,
            deleted: false,
            requires_admin_review: false,
            created_at: "2024-03-01 08:00:00".to_string(),
            last_updated_at: None,
            last_verified_at: None,
            last_reminded_at: None,
            reminder_count: 0,
        }
    }

    fn summary(uuid: &str, title: &str) -> PostingSummary {
        PostingSummary {
            uuid: uuid.to_string(),
            created_at: "2024-03-01 08:00:00".to_string(),
            category: "Masterarbeit".to_string(),
            posting_type: String::new(),
            title: title.to_string(),
            text: "Beschreibung".to_string(),
        }
    }

    #[test]
    fn test_nl2br_escapes_first() {
        assert_eq!(nl2br("a <b>\r\nc"), "a &lt;b&gt;<br>c");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("kurz", 10), "kurz");
        assert_eq!(excerpt("äöü äöü", 4), "äöü…");
    }

    #[test]
    fn test_markdown_to_html() {
        assert_eq!(
            markdown_to_html("**fett**").trim(),
            "<p><strong>fett</strong></p>"
        );
    }

    #[test]
    fn test_all_templates_parse() {
        assert!(Pages::new(&config()).is_ok());
    }

    #[test]
    fn test_index_page() {
        let pages = Pages::new(&config()).unwrap();
        let html = pages
            .index(
                &[summary("id-1", "Erstes <Thema>")],
                &["Angebot gelöscht.".to_string()],
            )
            .unwrap();

        assert!(html.contains("<title>Forschungsarbeitbörse</title>"));
        assert!(html.contains("<strong>Börse</strong>"));
        assert!(html.contains("href=\"https://example.org/impressum\""));
        assert!(html.contains("href=\"/id-1\""));
        assert!(html.contains("Erstes &lt;Thema&gt;"));
        assert!(html.contains("Angebot gelöscht."));
    }

    #[test]
    fn test_index_page_empty() {
        let pages = Pages::new(&config()).unwrap();
        let html = pages.index(&[], &[]).unwrap();
        assert!(html.contains("keine Angebote"));
    }

    #[test]
    fn test_posting_page_public() {
        let pages = Pages::new(&config()).unwrap();
        let html = pages.posting(&posting(), None, &[]).unwrap();

        assert!(html.contains("<title>Proteine &lt;live&gt;</title>"));
        assert!(html.contains("Zeile 1<br>Zeile &lt;2&gt;"));
        assert!(html.contains("01.03.2024 08:00"));
        assert!(!html.contains("/delete"));
    }

    #[test]
    fn test_posting_page_admin_controls() {
        let pages = Pages::new(&config()).unwrap();
        let html = pages.posting(&posting(), Some("adm"), &[]).unwrap();

        assert!(html.contains("/3f2b8c1e-0000-4000-8000-000000000001/adm/admin"));
        assert!(!html.contains("/verify"));
        assert!(html.contains("/3f2b8c1e-0000-4000-8000-000000000001/adm/delete"));
        assert!(html.contains("Wartet auf Verifizierung"));
    }

    #[test]
    fn test_form_page_new_with_errors() {
        let pages = Pages::new(&config()).unwrap();
        let form = PostingForm {
            category: "Masterarbeit".to_string(),
            ..Default::default()
        };
        let errors = vec![FieldError::new("title", "Ein Titel ist erforderlich.")];
        let institutes = vec!["Institut A".to_string()];
        let html = pages
            .form(FormPage {
                form: &form,
                edit: None,
                institutes: &institutes,
                errors: &errors,
            })
            .unwrap();

        assert!(html.contains("<title>Neues Angebot</title>"));
        assert!(html.contains("action=\"/new\""));
        assert!(html.contains("name=\"email\""));
        assert!(html.contains("Ein Titel ist erforderlich."));
        assert!(html.contains("<option value=\"Institut A\">"));
        assert!(html.contains("<option value=\"Masterarbeit\" selected>"));
        assert!(html.contains("<option value=\"Bachelorarbeit\">"));
    }

    #[test]
    fn test_form_page_edit() {
        let pages = Pages::new(&config()).unwrap();
        let form = PostingForm::from_posting(&posting());
        let html = pages
            .form(FormPage {
                form: &form,
                edit: Some(("3f2b8c1e-0000-4000-8000-000000000001", "adm")),
                institutes: &[],
                errors: &[],
            })
            .unwrap();

        assert!(html.contains("action=\"/3f2b8c1e-0000-4000-8000-000000000001/adm/admin\""));
        assert!(!html.contains("name=\"email\""));
        assert!(html.contains("value=\"anna@uni.example\" disabled"));
        assert!(html.contains("Zeile 1\nZeile &lt;2&gt;</textarea>"));
    }

    #[test]
    fn test_error_page() {
        let pages = Pages::new(&config()).unwrap();
        let html = pages.error(ErrorPage::NotFound).unwrap();
        assert!(html.contains("Seite nicht gefunden"));
    }

    #[test]
    fn test_feed() {
        let pages = Pages::new(&config()).unwrap();
        let xml = pages
            .feed(&[summary("id-2", "Zwei & mehr"), summary("id-1", "Eins")])
            .unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<link>https://boerse.example/feed</link>"));
        assert!(xml.contains("<title>Zwei &amp; mehr</title>"));
        assert!(xml.contains("<link>https://boerse.example/id-2</link>"));
        assert!(xml.contains("<guid isPermaLink=\"false\">id-1</guid>"));
        assert!(xml.contains("Fri, 01 Mar 2024 08:00:00 +0000"));
        assert_eq!(xml.matches("<item>").count(), 2);
    }

    #[test]
    fn test_feed_empty() {
        let pages = Pages::new(&config()).unwrap();
        let xml = pages.feed(&[]).unwrap();
        assert!(!xml.contains("<item>"));
        assert!(!xml.contains("<pubDate>"));
    }
}
