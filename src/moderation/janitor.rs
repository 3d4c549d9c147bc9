//! Reminder janitor.
//!
//! Periodically re-sends the mail that unblocks a pending posting: the
//! review request to the admin, or the verification mail to the submitter.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::context::AppContext;
use crate::Result;

/// Outcome of one janitor pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderReport {
    /// Reminders delivered.
    pub sent: usize,
    /// Reminders that failed and will be retried on a later pass.
    pub failed: usize,
}

/// Background reminder task.
pub struct Janitor {
    ctx: Arc<AppContext>,
    period: Duration,
}

impl Janitor {
    /// Create a janitor using the configured interval.
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let period = Duration::from_secs(ctx.config.janitor.interval_secs.max(1));
        Self { ctx, period }
    }

    /// Create a janitor with a custom interval.
    pub fn with_interval(ctx: Arc<AppContext>, period: Duration) -> Self {
        Self { ctx, period }
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "Janitor started (interval: {} seconds)",
            self.period.as_secs()
        );

        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            if let Err(e) = run_once(&self.ctx, &shutdown).await {
                error!(error = %e, "janitor pass failed");
            }
        }

        info!("Janitor stopped");
    }

    /// Spawn the janitor on the runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

/// One reminder pass over all due postings.
///
/// Failures of single postings are logged and counted; only a failure to
/// list the due postings is returned as an error.
pub async fn run_once(ctx: &AppContext, shutdown: &CancellationToken) -> Result<ReminderReport> {
    let janitor = &ctx.config.janitor;
    let due = ctx
        .postings()
        .list_due_reminders(janitor.reminder_after_secs, janitor.max_reminders)
        .await?;

    let mut report = ReminderReport::default();
    if due.is_empty() {
        debug!("No postings due for a reminder");
        return Ok(report);
    }

    info!("Sending reminders for {} posting(s)", due.len());

    for posting in due {
        if shutdown.is_cancelled() {
            debug!("Janitor pass interrupted by shutdown");
            break;
        }

        match ctx.notifier.send_reminder(&posting).await {
            Ok(kind) => match ctx.postings().record_reminder(&posting.uuid).await {
                Ok(()) => {
                    report.sent += 1;
                    debug!(
                        posting = %posting.uuid,
                        template = kind.as_str(),
                        "reminder recorded"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        posting = %posting.uuid,
                        error = %e,
                        "reminder sent but not recorded"
                    );
                }
            },
            Err(e) => {
                report.failed += 1;
                error!(posting = %posting.uuid, error = %e, "failed to send reminder");
            }
        }
    }

    Ok(report)
}
