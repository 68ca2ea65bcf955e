//! End-to-end scheduler pass tests against an in-memory database and a
//! recording email sender.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};

use crate::db::Database;
use crate::integrations::EmailSender;
use crate::models::CreateCampaignRequest;
use crate::scheduler::{Scheduler, SchedulerConfig};

/// Records every send instead of talking to an API.
struct RecordingEmailSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingEmailSender {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), String> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Always fails, for send-failure paths.
struct FailingEmailSender;

#[async_trait]
impl EmailSender for FailingEmailSender {
    async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<(), String> {
        Err("simulated outage".to_string())
    }
}

fn test_config() -> SchedulerConfig {
    SchedulerConfig {
        poll_interval_secs: 60,
        // Zero timeout: open checkouts abandon on the first sweep
        inactivity_timeout_minutes: 0,
        donate_url: "https://donate.test/donate".to_string(),
    }
}

fn seed_campaign(db: &Database) -> i64 {
    db.create_campaign(&CreateCampaignRequest {
        slug: "orphan-sponsorship".to_string(),
        title: "Orphan Sponsorship".to_string(),
        description: None,
        image_url: None,
        goal_cents: None,
        currency: "usd".to_string(),
        category_id: None,
        donation_type: "general".to_string(),
        fulfillment_kind: "standard".to_string(),
        window_start: None,
        window_end: None,
        featured: false,
    })
    .expect("campaign")
    .id
}

fn seed_paid_donation(db: &Database, campaign_id: i64, fulfill_at: &str, email_at: &str) -> i64 {
    let donation = db
        .create_donation(
            "don-test",
            "cs_test_sched",
            campaign_id,
            Some("Maryam"),
            Some("maryam@example.com"),
            5000,
            "usd",
            "once",
            0,
        )
        .expect("donation");
    let now = Utc::now().to_rfc3339();
    assert!(db
        .mark_donation_paid(donation.id, Some("pi_test"), &now, fulfill_at, email_at)
        .expect("paid"));
    donation.id
}

#[tokio::test]
async fn due_donation_is_fulfilled_and_emailed_once() {
    let db = Arc::new(Database::new(":memory:").expect("db"));
    let campaign_id = seed_campaign(&db);
    let past = (Utc::now() - Duration::hours(2)).to_rfc3339();
    seed_paid_donation(&db, campaign_id, &past, &past);

    let email = Arc::new(RecordingEmailSender::new());
    let scheduler = Scheduler::new(db.clone(), email.clone(), test_config());

    let first = scheduler.run_fulfillment_pass().await.expect("pass");
    assert_eq!(first.fulfilled, 1);
    assert_eq!(first.emailed, 1);

    let sent = email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "maryam@example.com");
    assert!(sent[0].1.contains("Orphan Sponsorship"));

    // Second pass: nothing left to do
    let second = scheduler.run_fulfillment_pass().await.expect("pass");
    assert_eq!(second.fulfilled, 0);
    assert_eq!(second.emailed, 0);
    assert_eq!(email.sent().len(), 1);
}

#[tokio::test]
async fn email_failure_leaves_donation_for_next_poll() {
    let db = Arc::new(Database::new(":memory:").expect("db"));
    let campaign_id = seed_campaign(&db);
    let past = (Utc::now() - Duration::hours(2)).to_rfc3339();
    let donation_id = seed_paid_donation(&db, campaign_id, &past, &past);

    let scheduler = Scheduler::new(db.clone(), Arc::new(FailingEmailSender), test_config());
    let summary = scheduler.run_fulfillment_pass().await.expect("pass");
    assert_eq!(summary.fulfilled, 1);
    assert_eq!(summary.emailed, 0);

    // Still waiting on the email; a working sender picks it up later
    let email = Arc::new(RecordingEmailSender::new());
    let retry = Scheduler::new(db.clone(), email.clone(), test_config());
    let summary = retry.run_fulfillment_pass().await.expect("pass");
    assert_eq!(summary.fulfilled, 0);
    assert_eq!(summary.emailed, 1);
    assert_eq!(email.sent().len(), 1);

    let donation = db
        .get_donation_by_session("cs_test_sched")
        .expect("get")
        .expect("exists");
    assert_eq!(donation.id, donation_id);
    assert_eq!(donation.fulfillment_status, "emailed");
}

#[tokio::test]
async fn recovery_pass_abandons_then_emails_with_gap() {
    let db = Arc::new(Database::new(":memory:").expect("db"));
    let campaign_id = seed_campaign(&db);
    db.create_abandoned_checkout("cs_rec_1", campaign_id, "idris@example.com", 2500, "usd", "once")
        .expect("checkout");

    let email = Arc::new(RecordingEmailSender::new());
    let scheduler = Scheduler::new(db.clone(), email.clone(), test_config());

    // First pass abandons the idle checkout; the 1-hour mark for the first
    // email hasn't passed yet
    let summary = scheduler.run_recovery_pass().await.expect("pass");
    assert_eq!(summary.newly_abandoned, 1);
    assert_eq!(summary.emails_sent, 0);

    // Backdate abandonment two hours so the first email is due
    let two_hours_ago = (Utc::now() - Duration::hours(2)).to_rfc3339();
    db.conn
        .lock()
        .unwrap()
        .execute(
            "UPDATE abandoned_checkouts SET abandoned_at = ?1",
            [&two_hours_ago],
        )
        .expect("backdate");

    let summary = scheduler.run_recovery_pass().await.expect("pass");
    assert_eq!(summary.emails_sent, 1);
    assert_eq!(email.sent().len(), 1);
    assert_eq!(email.sent()[0].0, "idris@example.com");

    // Immediate re-run: min gap holds the second email back even though
    // nothing else changed
    let summary = scheduler.run_recovery_pass().await.expect("pass");
    assert_eq!(summary.emails_sent, 0);
    assert_eq!(email.sent().len(), 1);
}

#[tokio::test]
async fn paying_after_recovery_email_marks_checkout_recovered() {
    let db = Arc::new(Database::new(":memory:").expect("db"));
    let campaign_id = seed_campaign(&db);
    let checkout = db
        .create_abandoned_checkout("cs_rec_2", campaign_id, "idris@example.com", 2500, "usd", "once")
        .expect("checkout");

    db.mark_checkout_abandoned("cs_rec_2").expect("abandon");
    db.record_recovery_email(checkout.id, false).expect("email");

    let status = db.complete_checkout("cs_rec_2").expect("complete");
    assert_eq!(status.as_deref(), Some("recovered"));
}
