//! Background scheduler: polls for due donations and stale checkouts.
//!
//! Both passes are plain "select due rows, act once, flip the status flag"
//! loops. Transitions are guarded in SQL, so a pass double-firing (or the
//! cron endpoints triggering one mid-tick) finds nothing to do the second
//! time.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{interval, Duration as TokioDuration};

use crate::config::Config;
use crate::db::Database;
use crate::integrations::email::{templates, EmailSender};
use crate::recovery;

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Poll interval in seconds for checking due rows
    pub poll_interval_secs: u64,
    /// Minutes without checkout-page activity before a checkout is abandoned
    pub inactivity_timeout_minutes: i64,
    /// Base URL recovery emails link back to
    pub donate_url: String,
}

impl SchedulerConfig {
    pub fn from_config(config: &Config) -> Self {
        SchedulerConfig {
            poll_interval_secs: config.scheduler_poll_interval_secs,
            inactivity_timeout_minutes: config.checkout_inactivity_minutes,
            donate_url: config.checkout_cancel_url.clone(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            poll_interval_secs: 60,
            inactivity_timeout_minutes: 30,
            donate_url: crate::config::defaults::CHECKOUT_CANCEL_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct FulfillmentSummary {
    pub fulfilled: usize,
    pub emailed: usize,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RecoverySummary {
    pub newly_abandoned: usize,
    pub emails_sent: usize,
    pub exhausted: usize,
}

/// The scheduler service that runs the fulfillment and recovery passes
pub struct Scheduler {
    db: Arc<Database>,
    email: Arc<dyn EmailSender>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(db: Arc<Database>, email: Arc<dyn EmailSender>, config: SchedulerConfig) -> Self {
        Scheduler { db, email, config }
    }

    /// Start the scheduler background task
    pub async fn start(self: Arc<Self>, mut shutdown_rx: oneshot::Receiver<()>) {
        log::info!(
            "Scheduler started (poll: {}s, inactivity timeout: {}m)",
            self.config.poll_interval_secs,
            self.config.inactivity_timeout_minutes
        );

        let mut poll_interval = interval(TokioDuration::from_secs(self.config.poll_interval_secs));

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    log::info!("Scheduler received shutdown signal");
                    break;
                }
                _ = poll_interval.tick() => {
                    self.tick().await;
                }
            }
        }

        log::info!("Scheduler stopped");
    }

    /// Process one tick of the scheduler
    async fn tick(&self) {
        if let Err(e) = self.run_fulfillment_pass().await {
            log::error!("Error in fulfillment pass: {}", e);
        }
        if let Err(e) = self.run_recovery_pass().await {
            log::error!("Error in recovery pass: {}", e);
        }
    }

    /// One fulfillment pass: pending -> fulfilled for due rows, then send
    /// confirmation emails whose local send time has arrived.
    pub async fn run_fulfillment_pass(&self) -> Result<FulfillmentSummary, String> {
        let mut summary = FulfillmentSummary::default();
        let now_str = Utc::now().to_rfc3339();

        let due = self
            .db
            .list_due_fulfillments(&now_str)
            .map_err(|e| format!("Failed to list due fulfillments: {}", e))?;

        for donation in due {
            match self.db.mark_donation_fulfilled(donation.id) {
                Ok(true) => {
                    log::info!(
                        "Donation {} fulfilled ({} to campaign {})",
                        donation.donation_id,
                        donation.amount_cents,
                        donation.campaign_id
                    );
                    summary.fulfilled += 1;
                }
                // Another pass beat us to it
                Ok(false) => {}
                Err(e) => log::error!("Failed to mark donation {} fulfilled: {}", donation.id, e),
            }
        }

        let due_emails = self
            .db
            .list_due_fulfillment_emails(&now_str)
            .map_err(|e| format!("Failed to list due emails: {}", e))?;

        for donation in due_emails {
            let to = match donation.donor_email.as_deref() {
                Some(email) => email,
                None => continue,
            };

            let campaign_title = self
                .db
                .get_campaign(donation.campaign_id)
                .ok()
                .flatten()
                .map(|c| c.title)
                .unwrap_or_else(|| "your chosen cause".to_string());

            let (subject, html) =
                templates::fulfillment(&campaign_title, donation.amount_cents, &donation.currency);

            match self.email.send(to, &subject, &html).await {
                Ok(()) => {
                    if self.db.mark_donation_emailed(donation.id).unwrap_or(false) {
                        summary.emailed += 1;
                    }
                }
                // Leave the row; the next poll retries
                Err(e) => log::warn!(
                    "Failed to send fulfillment email for donation {}: {}",
                    donation.donation_id,
                    e
                ),
            }
        }

        Ok(summary)
    }

    /// One recovery pass: sweep inactive checkouts to abandoned, then step
    /// due checkouts through the recovery email schedule.
    pub async fn run_recovery_pass(&self) -> Result<RecoverySummary, String> {
        let mut summary = RecoverySummary::default();
        let now = Utc::now();

        let cutoff =
            (now - Duration::minutes(self.config.inactivity_timeout_minutes)).to_rfc3339();
        summary.newly_abandoned = self
            .db
            .mark_inactive_abandoned(&cutoff)
            .map_err(|e| format!("Failed to sweep inactive checkouts: {}", e))?;
        if summary.newly_abandoned > 0 {
            log::info!("Marked {} checkouts abandoned", summary.newly_abandoned);
        }

        let candidates = self
            .db
            .list_recovery_candidates(recovery::MAX_RECOVERY_EMAILS)
            .map_err(|e| format!("Failed to list recovery candidates: {}", e))?;

        for checkout in candidates {
            let abandoned_at = match checkout.abandoned_at.as_deref().and_then(parse_rfc3339) {
                Some(ts) => ts,
                None => continue,
            };
            let last_email_at = checkout.last_email_at.as_deref().and_then(parse_rfc3339);

            let step = match recovery::next_email_step(
                checkout.emails_sent,
                abandoned_at,
                last_email_at,
                now,
            ) {
                Some(step) => step,
                None => continue,
            };

            let campaign = self.db.get_campaign(checkout.campaign_id).ok().flatten();
            let campaign_title = campaign
                .as_ref()
                .map(|c| c.title.clone())
                .unwrap_or_else(|| "your chosen cause".to_string());
            let resume_url = match campaign.as_ref() {
                Some(c) => format!("{}?campaign={}", self.config.donate_url, c.slug),
                None => self.config.donate_url.clone(),
            };

            let (subject, html) = templates::recovery(
                step,
                &campaign_title,
                checkout.amount_cents,
                &checkout.currency,
                &resume_url,
            );

            match self.email.send(&checkout.email, &subject, &html).await {
                Ok(()) => {
                    let exhausted = checkout.emails_sent + 1 >= recovery::MAX_RECOVERY_EMAILS;
                    if let Err(e) = self.db.record_recovery_email(checkout.id, exhausted) {
                        log::error!(
                            "Failed to record recovery email for checkout {}: {}",
                            checkout.id,
                            e
                        );
                        continue;
                    }
                    summary.emails_sent += 1;
                    if exhausted {
                        summary.exhausted += 1;
                    }
                    log::info!(
                        "Sent recovery email {} of {} for checkout {}",
                        step + 1,
                        recovery::MAX_RECOVERY_EMAILS,
                        checkout.checkout_session_id
                    );
                }
                Err(e) => log::warn!(
                    "Failed to send recovery email for checkout {}: {}",
                    checkout.checkout_session_id,
                    e
                ),
            }
        }

        Ok(summary)
    }
}

pub(crate) fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
