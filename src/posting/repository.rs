//! Posting repository for Boerse.

use crate::db::DbPool;
use crate::Result;

use super::types::{NewPosting, Posting, PostingSummary};
use super::validation::PostingFields;

/// Number of items in the feed.
pub const FEED_LIMIT: i64 = 30;

const POSTING_COLUMNS: &str = "id, uuid, admin_token, verify_token, email, title, institute, \
     advisor, supervisor, audience, category, posting_type, degree, start_date, \
     required_months, required_effort, text, verified, deleted, requires_admin_review, \
     created_at, last_updated_at, last_verified_at, last_reminded_at, reminder_count";

/// Database row of the postings table.
#[derive(Debug, sqlx::FromRow)]
struct PostingRow {
    id: i64,
    uuid: String,
    admin_token: String,
    verify_token: String,
    email: String,
    title: String,
    institute: String,
    advisor: String,
    supervisor: String,
    audience: String,
    category: String,
    posting_type: String,
    degree: String,
    start_date: String,
    required_months: i64,
    required_effort: String,
    text: String,
    verified: bool,
    deleted: bool,
    requires_admin_review: bool,
    created_at: String,
    last_updated_at: Option<String>,
    last_verified_at: Option<String>,
    last_reminded_at: Option<String>,
    reminder_count: i64,
}

impl PostingRow {
    fn into_posting(self) -> Posting {
        Posting {
            id: self.id,
            uuid: self.uuid,
            admin_token: self.admin_token,
            verify_token: self.verify_token,
            email: self.email,
            fields: PostingFields {
                title: self.title,
                institute: self.institute,
                advisor: self.advisor,
                supervisor: self.supervisor,
                audience: self.audience,
                category: self.category,
                posting_type: self.posting_type,
                degree: self.degree,
                start: self.start_date,
                required_months: self.required_months,
                required_effort: self.required_effort,
                text: self.text,
            },
            verified: self.verified,
            deleted: self.deleted,
            requires_admin_review: self.requires_admin_review,
            created_at: self.created_at,
            last_updated_at: self.last_updated_at,
            last_verified_at: self.last_verified_at,
            last_reminded_at: self.last_reminded_at,
            reminder_count: self.reminder_count,
        }
    }
}

/// SQLite modifier shifting `now` back by the given number of seconds.
fn seconds_ago(secs: u64) -> String {
    format!("-{secs} seconds")
}

/// Repository for posting operations.
pub struct PostingRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostingRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new posting and return the stored record.
    pub async fn create(&self, new_posting: &NewPosting) -> Result<Posting> {
        let f = &new_posting.fields;
        sqlx::query(
            "INSERT INTO postings (uuid, admin_token, verify_token, email, title, institute,
                advisor, supervisor, audience, category, posting_type, degree, start_date,
                required_months, required_effort, text, requires_admin_review)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(&new_posting.uuid)
        .bind(&new_posting.admin_token)
        .bind(&new_posting.verify_token)
        .bind(&new_posting.email)
        .bind(&f.title)
        .bind(&f.institute)
        .bind(&f.advisor)
        .bind(&f.supervisor)
        .bind(&f.audience)
        .bind(&f.category)
        .bind(&f.posting_type)
        .bind(&f.degree)
        .bind(&f.start)
        .bind(f.required_months)
        .bind(&f.required_effort)
        .bind(&f.text)
        .bind(new_posting.requires_admin_review)
        .execute(self.pool)
        .await?;

        self.get_by_uuid(&new_posting.uuid)
            .await?
            .ok_or_else(|| crate::BoerseError::Internal("inserted posting vanished".into()))
    }

    /// Get a posting by its public id, including deleted ones.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Posting>> {
        let sql = format!("SELECT {POSTING_COLUMNS} FROM postings WHERE uuid = $1");
        let row = sqlx::query_as::<_, PostingRow>(&sql)
            .bind(uuid)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(PostingRow::into_posting))
    }

    /// List all public postings, newest first.
    pub async fn list_public(&self) -> Result<Vec<PostingSummary>> {
        let rows = sqlx::query_as::<_, PostingSummary>(
            "SELECT uuid, created_at, category, posting_type, title, text
             FROM postings
             WHERE verified = 1 AND deleted = 0
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// List the newest public postings, at most `limit`.
    pub async fn list_recent_public(&self, limit: i64) -> Result<Vec<PostingSummary>> {
        let rows = sqlx::query_as::<_, PostingSummary>(
            "SELECT uuid, created_at, category, posting_type, title, text
             FROM postings
             WHERE verified = 1 AND deleted = 0
             ORDER BY created_at DESC, id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Distinct institutes of public postings, most recently used first.
    pub async fn list_institutes(&self) -> Result<Vec<String>> {
        let institutes: Vec<String> = sqlx::query_scalar(
            "SELECT institute
             FROM postings
             WHERE verified = 1 AND deleted = 0 AND institute <> ''
             GROUP BY institute
             ORDER BY MAX(id) DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(institutes)
    }

    /// Mark a posting verified. Returns false if no row matched.
    pub async fn mark_verified(&self, uuid: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE postings SET verified = 1, last_verified_at = datetime('now') WHERE uuid = $1",
        )
        .bind(uuid)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the editable fields of an undeleted posting.
    pub async fn update_fields(&self, uuid: &str, fields: &PostingFields) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE postings SET
                title = $1, institute = $2, advisor = $3, supervisor = $4, audience = $5,
                category = $6, posting_type = $7, degree = $8, start_date = $9,
                required_months = $10, required_effort = $11, text = $12,
                last_updated_at = datetime('now')
             WHERE uuid = $13 AND deleted = 0",
        )
        .bind(&fields.title)
        .bind(&fields.institute)
        .bind(&fields.advisor)
        .bind(&fields.supervisor)
        .bind(&fields.audience)
        .bind(&fields.category)
        .bind(&fields.posting_type)
        .bind(&fields.degree)
        .bind(&fields.start)
        .bind(fields.required_months)
        .bind(&fields.required_effort)
        .bind(&fields.text)
        .bind(uuid)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a posting. Repeating is harmless.
    pub async fn soft_delete(&self, uuid: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE postings SET deleted = 1 WHERE uuid = $1")
            .bind(uuid)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unverified postings due for a reminder.
    ///
    /// A posting is due when it is older than `after_secs`, its last
    /// reminder (if any) is older than `after_secs`, and it has received
    /// fewer than `max_reminders` reminders.
    pub async fn list_due_reminders(
        &self,
        after_secs: u64,
        max_reminders: i64,
    ) -> Result<Vec<Posting>> {
        let sql = format!(
            "SELECT {POSTING_COLUMNS} FROM postings
             WHERE verified = 0 AND deleted = 0
               AND reminder_count < $1
               AND created_at <= datetime('now', $2)
               AND (last_reminded_at IS NULL OR last_reminded_at <= datetime('now', $2))
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, PostingRow>(&sql)
            .bind(max_reminders)
            .bind(seconds_ago(after_secs))
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(PostingRow::into_posting).collect())
    }

    /// Record that a reminder was sent.
    pub async fn record_reminder(&self, uuid: &str) -> Result<()> {
        sqlx::query(
            "UPDATE postings
             SET last_reminded_at = datetime('now'), reminder_count = reminder_count + 1
             WHERE uuid = $1",
        )
        .bind(uuid)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::generate_token;
    use crate::Database;

    fn new_posting(title: &str) -> NewPosting {
        NewPosting {
            uuid: uuid::Uuid::new_v4().to_string(),
            admin_token: generate_token(),
            verify_token: generate_token(),
            email: "student@uni.example".to_string(),
            fields: PostingFields {
                title: title.to_string(),
                institute: "Institut A".to_string(),
                required_months: 6,
                text: "Beschreibung".to_string(),
                ..Default::default()
            },
            requires_admin_review: false,
        }
    }

    async fn set_created_at(db: &Database, uuid: &str, created_at: &str) {
        sqlx::query("UPDATE postings SET created_at = $1 WHERE uuid = $2")
            .bind(created_at)
            .bind(uuid)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PostingRepository::new(db.pool());

        let new = new_posting("Thema");
        let posting = repo.create(&new).await.unwrap();

        assert_eq!(posting.uuid, new.uuid);
        assert_eq!(posting.fields, new.fields);
        assert_eq!(posting.admin_token, new.admin_token);
        assert!(!posting.verified);
        assert!(!posting.deleted);
        assert_eq!(posting.reminder_count, 0);
        assert!(posting.last_verified_at.is_none());

        assert!(repo.get_by_uuid("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_and_list_order() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PostingRepository::new(db.pool());

        let older = repo.create(&new_posting("older")).await.unwrap();
        let newer = repo.create(&new_posting("newer")).await.unwrap();
        let tie = repo.create(&new_posting("tie")).await.unwrap();
        let hidden = repo.create(&new_posting("hidden")).await.unwrap();

        set_created_at(&db, &older.uuid, "2024-01-01 10:00:00").await;
        set_created_at(&db, &newer.uuid, "2024-02-01 10:00:00").await;
        set_created_at(&db, &tie.uuid, "2024-02-01 10:00:00").await;

        for p in [&older, &newer, &tie] {
            assert!(repo.mark_verified(&p.uuid).await.unwrap());
        }

        let list = repo.list_public().await.unwrap();
        let titles: Vec<&str> = list.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["tie", "newer", "older"]);
        assert!(!list.iter().any(|p| p.uuid == hidden.uuid));

        let recent = repo.list_recent_public(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "tie");
    }

    #[tokio::test]
    async fn test_mark_verified_stamps_time() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PostingRepository::new(db.pool());
        let p = repo.create(&new_posting("x")).await.unwrap();

        repo.mark_verified(&p.uuid).await.unwrap();
        let p = repo.get_by_uuid(&p.uuid).await.unwrap().unwrap();
        assert!(p.verified);
        assert!(p.last_verified_at.is_some());

        assert!(!repo.mark_verified("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PostingRepository::new(db.pool());
        let p = repo.create(&new_posting("x")).await.unwrap();
        repo.mark_verified(&p.uuid).await.unwrap();

        assert!(repo.soft_delete(&p.uuid).await.unwrap());
        assert!(repo.soft_delete(&p.uuid).await.unwrap());

        assert!(repo.list_public().await.unwrap().is_empty());
        let stored = repo.get_by_uuid(&p.uuid).await.unwrap().unwrap();
        assert!(stored.deleted);
        assert_eq!(stored.admin_token, p.admin_token);
    }

    #[tokio::test]
    async fn test_update_fields() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PostingRepository::new(db.pool());
        let p = repo.create(&new_posting("before")).await.unwrap();

        let mut fields = p.fields.clone();
        fields.title = "after".to_string();
        fields.required_months = 12;
        assert!(repo.update_fields(&p.uuid, &fields).await.unwrap());

        let stored = repo.get_by_uuid(&p.uuid).await.unwrap().unwrap();
        assert_eq!(stored.fields.title, "after");
        assert_eq!(stored.fields.required_months, 12);
        assert_eq!(stored.email, p.email);
        assert!(stored.last_updated_at.is_some());

        repo.soft_delete(&p.uuid).await.unwrap();
        assert!(!repo.update_fields(&p.uuid, &fields).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_institutes() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PostingRepository::new(db.pool());

        let mut a = new_posting("a");
        a.fields.institute = "Anatomie".to_string();
        let mut b = new_posting("b");
        b.fields.institute = "Biochemie".to_string();
        let mut c = new_posting("c");
        c.fields.institute = "Anatomie".to_string();
        let mut empty = new_posting("d");
        empty.fields.institute = String::new();
        let unverified = new_posting("e");

        for p in [&a, &b, &c, &empty] {
            repo.create(p).await.unwrap();
            repo.mark_verified(&p.uuid).await.unwrap();
        }
        repo.create(&unverified).await.unwrap();

        let institutes = repo.list_institutes().await.unwrap();
        assert_eq!(institutes, vec!["Anatomie", "Biochemie"]);
    }

    #[tokio::test]
    async fn test_due_reminders() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PostingRepository::new(db.pool());

        let fresh = repo.create(&new_posting("fresh")).await.unwrap();
        let stale = repo.create(&new_posting("stale")).await.unwrap();
        let verified = repo.create(&new_posting("verified")).await.unwrap();

        set_created_at(&db, &stale.uuid, "2020-01-01 00:00:00").await;
        set_created_at(&db, &verified.uuid, "2020-01-01 00:00:00").await;
        repo.mark_verified(&verified.uuid).await.unwrap();

        let due = repo.list_due_reminders(3600, 3).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].uuid, stale.uuid);
        assert_ne!(due[0].uuid, fresh.uuid);

        repo.record_reminder(&stale.uuid).await.unwrap();
        assert!(repo.list_due_reminders(3600, 3).await.unwrap().is_empty());

        let stored = repo.get_by_uuid(&stale.uuid).await.unwrap().unwrap();
        assert_eq!(stored.reminder_count, 1);
        assert!(stored.last_reminded_at.is_some());
    }

    #[tokio::test]
    async fn test_due_reminders_respects_max() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PostingRepository::new(db.pool());
        let p = repo.create(&new_posting("p")).await.unwrap();
        set_created_at(&db, &p.uuid, "2020-01-01 00:00:00").await;

        sqlx::query(
            "UPDATE postings SET reminder_count = 2, last_reminded_at = '2020-01-02 00:00:00'
             WHERE uuid = $1",
        )
        .bind(&p.uuid)
        .execute(db.pool())
        .await
        .unwrap();

        assert_eq!(repo.list_due_reminders(60, 3).await.unwrap().len(), 1);
        assert!(repo.list_due_reminders(60, 2).await.unwrap().is_empty());
    }
}
