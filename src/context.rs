//! Application context shared by handlers and background tasks.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::Database;
use crate::moderation::{AddressPolicy, ModerationService};
use crate::notify::{EmailSender, Notifier};
use crate::posting::PostingRepository;
use crate::Result;

/// Everything a request or the janitor needs, built once at startup.
pub struct AppContext {
    pub config: Config,
    pub db: Database,
    pub policy: AddressPolicy,
    pub notifier: Notifier,
}

impl AppContext {
    /// Build the context; fails on invalid mail patterns or mail templates.
    pub fn new(config: Config, db: Database, sender: Arc<dyn EmailSender>) -> Result<Self> {
        let policy = AddressPolicy::from_config(&config.moderation)?;
        let notifier = Notifier::new(&config, sender)?;
        Ok(Self {
            config,
            db,
            policy,
            notifier,
        })
    }

    /// Delay imposed on deny-listed submissions.
    pub fn deny_delay(&self) -> Duration {
        Duration::from_millis(self.config.moderation.deny_delay_ms)
    }

    /// Posting repository on the shared pool.
    pub fn postings(&self) -> PostingRepository<'_> {
        PostingRepository::new(self.db.pool())
    }

    /// Moderation workflow bound to this context.
    pub fn moderation(&self) -> ModerationService<'_> {
        ModerationService::new(self)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("db", &self.db)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
