//! Donation, subscription, and webhook-event database operations
//!
//! Status transitions are guarded in the WHERE clause so a double-firing
//! poll or a replayed webhook updates zero rows instead of repeating a
//! side effect.

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::{Donation, DonationStats, DonationSubscription};

const DONATION_COLUMNS: &str =
    "id, donation_id, checkout_session_id, payment_intent_id, campaign_id, donor_name,
     donor_email, amount_cents, currency, frequency, payment_status, fulfillment_status,
     fulfill_at, email_at, tz_offset_minutes, paid_at, created_at, updated_at";

const SUBSCRIPTION_COLUMNS: &str =
    "id, subscription_id, donation_id, customer_id, status, amount_cents, currency,
     current_period_end, created_at, updated_at";

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn create_donation(
        &self,
        donation_id: &str,
        checkout_session_id: &str,
        campaign_id: i64,
        donor_name: Option<&str>,
        donor_email: Option<&str>,
        amount_cents: i64,
        currency: &str,
        frequency: &str,
        tz_offset_minutes: i32,
    ) -> SqliteResult<Donation> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO donations (donation_id, checkout_session_id, campaign_id, donor_name,
                                    donor_email, amount_cents, currency, frequency,
                                    tz_offset_minutes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            rusqlite::params![
                donation_id,
                checkout_session_id,
                campaign_id,
                donor_name,
                donor_email,
                amount_cents,
                currency,
                frequency,
                tz_offset_minutes,
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM donations WHERE id = ?1", DONATION_COLUMNS),
            [id],
            map_donation_row,
        )
    }

    pub fn get_donation(&self, id: i64) -> SqliteResult<Option<Donation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM donations WHERE id = ?1", DONATION_COLUMNS),
            [id],
            map_donation_row,
        )
        .optional()
    }

    pub fn get_donation_by_session(&self, checkout_session_id: &str) -> SqliteResult<Option<Donation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT {} FROM donations WHERE checkout_session_id = ?1",
                DONATION_COLUMNS
            ),
            [checkout_session_id],
            map_donation_row,
        )
        .optional()
    }

    pub fn get_donation_by_public_id(&self, donation_id: &str) -> SqliteResult<Option<Donation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM donations WHERE donation_id = ?1", DONATION_COLUMNS),
            [donation_id],
            map_donation_row,
        )
        .optional()
    }

    pub fn get_donation_by_payment_intent(&self, payment_intent_id: &str) -> SqliteResult<Option<Donation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT {} FROM donations WHERE payment_intent_id = ?1",
                DONATION_COLUMNS
            ),
            [payment_intent_id],
            map_donation_row,
        )
        .optional()
    }

    pub fn list_donations(
        &self,
        payment_status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> SqliteResult<Vec<Donation>> {
        let conn = self.conn.lock().unwrap();

        let donations = if let Some(status) = payment_status {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM donations WHERE payment_status = ?1
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                DONATION_COLUMNS
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![status, limit, offset], map_donation_row)?
                .filter_map(|r| r.ok())
                .collect();
            rows
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM donations ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                DONATION_COLUMNS
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![limit, offset], map_donation_row)?
                .filter_map(|r| r.ok())
                .collect();
            rows
        };

        Ok(donations)
    }

    /// Transition pending -> paid and stamp the fulfillment schedule.
    /// Returns false if the donation was already paid (replayed event).
    pub fn mark_donation_paid(
        &self,
        id: i64,
        payment_intent_id: Option<&str>,
        paid_at: &str,
        fulfill_at: &str,
        email_at: &str,
    ) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE donations
             SET payment_status = 'paid', payment_intent_id = ?1, paid_at = ?2,
                 fulfill_at = ?3, email_at = ?4, updated_at = ?5
             WHERE id = ?6 AND payment_status = 'pending'",
            rusqlite::params![payment_intent_id, paid_at, fulfill_at, email_at, now, id],
        )?;
        Ok(changed > 0)
    }

    /// Transition paid -> refunded. Returns false if not currently paid.
    pub fn mark_donation_refunded(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE donations SET payment_status = 'refunded', updated_at = ?1
             WHERE id = ?2 AND payment_status = 'paid'",
            rusqlite::params![now, id],
        )?;
        Ok(changed > 0)
    }

    /// Paid donations whose fulfill-at time has passed.
    pub fn list_due_fulfillments(&self, now: &str) -> SqliteResult<Vec<Donation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM donations
             WHERE payment_status = 'paid' AND fulfillment_status = 'pending'
               AND fulfill_at IS NOT NULL AND fulfill_at <= ?1
             ORDER BY fulfill_at ASC",
            DONATION_COLUMNS
        ))?;
        let donations = stmt
            .query_map([now], map_donation_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(donations)
    }

    pub fn mark_donation_fulfilled(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE donations SET fulfillment_status = 'fulfilled', updated_at = ?1
             WHERE id = ?2 AND fulfillment_status = 'pending'",
            rusqlite::params![now, id],
        )?;
        Ok(changed > 0)
    }

    /// Fulfilled donations whose confirmation email is due and sendable.
    pub fn list_due_fulfillment_emails(&self, now: &str) -> SqliteResult<Vec<Donation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM donations
             WHERE fulfillment_status = 'fulfilled'
               AND email_at IS NOT NULL AND email_at <= ?1
               AND donor_email IS NOT NULL
             ORDER BY email_at ASC",
            DONATION_COLUMNS
        ))?;
        let donations = stmt
            .query_map([now], map_donation_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(donations)
    }

    pub fn mark_donation_emailed(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE donations SET fulfillment_status = 'emailed', updated_at = ?1
             WHERE id = ?2 AND fulfillment_status = 'fulfilled'",
            rusqlite::params![now, id],
        )?;
        Ok(changed > 0)
    }

    pub fn donation_stats(&self) -> SqliteResult<DonationStats> {
        let conn = self.conn.lock().unwrap();

        let (total_donations, total_amount_cents): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(amount_cents), 0) FROM donations
             WHERE payment_status = 'paid'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let donor_count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT donor_email) FROM donations
             WHERE payment_status = 'paid' AND donor_email IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let active_subscriptions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM donation_subscriptions WHERE status = 'active'",
            [],
            |row| row.get(0),
        )?;

        Ok(DonationStats {
            total_donations,
            total_amount_cents,
            donor_count,
            active_subscriptions,
        })
    }

    /// Record a webhook event id. Returns true if this is the first time the
    /// event is seen; false means a duplicate delivery that must be skipped.
    pub fn insert_webhook_event(&self, event_id: &str, event_type: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "INSERT OR IGNORE INTO webhook_events (event_id, event_type, received_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![event_id, event_type, now],
        )?;
        Ok(changed > 0)
    }

    pub fn upsert_subscription(
        &self,
        subscription_id: &str,
        donation_id: i64,
        customer_id: Option<&str>,
        amount_cents: i64,
        currency: &str,
        current_period_end: Option<&str>,
    ) -> SqliteResult<DonationSubscription> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO donation_subscriptions (subscription_id, donation_id, customer_id,
                                                 status, amount_cents, currency,
                                                 current_period_end, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'active', ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(subscription_id) DO UPDATE SET
                 status = 'active',
                 current_period_end = excluded.current_period_end,
                 updated_at = excluded.updated_at",
            rusqlite::params![
                subscription_id,
                donation_id,
                customer_id,
                amount_cents,
                currency,
                current_period_end,
                now,
            ],
        )?;

        conn.query_row(
            &format!(
                "SELECT {} FROM donation_subscriptions WHERE subscription_id = ?1",
                SUBSCRIPTION_COLUMNS
            ),
            [subscription_id],
            map_subscription_row,
        )
    }

    pub fn get_subscription(&self, subscription_id: &str) -> SqliteResult<Option<DonationSubscription>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT {} FROM donation_subscriptions WHERE subscription_id = ?1",
                SUBSCRIPTION_COLUMNS
            ),
            [subscription_id],
            map_subscription_row,
        )
        .optional()
    }

    pub fn set_subscription_status(&self, subscription_id: &str, status: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE donation_subscriptions SET status = ?1, updated_at = ?2
             WHERE subscription_id = ?3",
            rusqlite::params![status, now, subscription_id],
        )?;
        Ok(changed > 0)
    }
}

fn map_donation_row(row: &rusqlite::Row) -> SqliteResult<Donation> {
    Ok(Donation {
        id: row.get(0)?,
        donation_id: row.get(1)?,
        checkout_session_id: row.get(2)?,
        payment_intent_id: row.get(3)?,
        campaign_id: row.get(4)?,
        donor_name: row.get(5)?,
        donor_email: row.get(6)?,
        amount_cents: row.get(7)?,
        currency: row.get(8)?,
        frequency: row.get(9)?,
        payment_status: row.get(10)?,
        fulfillment_status: row.get(11)?,
        fulfill_at: row.get(12)?,
        email_at: row.get(13)?,
        tz_offset_minutes: row.get(14)?,
        paid_at: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

fn map_subscription_row(row: &rusqlite::Row) -> SqliteResult<DonationSubscription> {
    Ok(DonationSubscription {
        id: row.get(0)?,
        subscription_id: row.get(1)?,
        donation_id: row.get(2)?,
        customer_id: row.get(3)?,
        status: row.get(4)?,
        amount_cents: row.get(5)?,
        currency: row.get(6)?,
        current_period_end: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::db::Database;
    use crate::models::CreateCampaignRequest;

    fn db_with_campaign() -> (Database, i64) {
        let db = Database::new(":memory:").expect("db");
        let campaign = db
            .create_campaign(&CreateCampaignRequest {
                slug: "gaza-emergency".to_string(),
                title: "Gaza Emergency".to_string(),
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
            .expect("campaign");
        (db, campaign.id)
    }

    #[test]
    fn webhook_event_insert_is_idempotent() {
        let (db, _) = db_with_campaign();

        assert!(db
            .insert_webhook_event("evt_123", "checkout.session.completed")
            .expect("insert"));
        // Second delivery of the same event must report duplicate
        assert!(!db
            .insert_webhook_event("evt_123", "checkout.session.completed")
            .expect("insert"));
        assert!(db
            .insert_webhook_event("evt_456", "invoice.paid")
            .expect("insert"));
    }

    #[test]
    fn mark_paid_guards_against_replay() {
        let (db, campaign_id) = db_with_campaign();
        let donation = db
            .create_donation(
                "don-1",
                "cs_test_1",
                campaign_id,
                Some("Aisha"),
                Some("aisha@example.com"),
                5000,
                "usd",
                "once",
                0,
            )
            .expect("donation");

        let now = Utc::now().to_rfc3339();
        assert!(db
            .mark_donation_paid(donation.id, Some("pi_1"), &now, &now, &now)
            .expect("first"));
        // Replayed event: zero rows should change
        assert!(!db
            .mark_donation_paid(donation.id, Some("pi_1"), &now, &now, &now)
            .expect("second"));
    }

    #[test]
    fn due_queries_respect_status_and_timestamps() {
        let (db, campaign_id) = db_with_campaign();
        let donation = db
            .create_donation(
                "don-1",
                "cs_test_1",
                campaign_id,
                None,
                Some("omar@example.com"),
                2500,
                "usd",
                "once",
                0,
            )
            .expect("donation");

        let past = (Utc::now() - Duration::hours(1)).to_rfc3339();
        let future = (Utc::now() + Duration::hours(1)).to_rfc3339();
        let now = Utc::now().to_rfc3339();

        // fulfill_at in the past, email_at in the future
        db.mark_donation_paid(donation.id, None, &now, &past, &future)
            .expect("paid");

        let due = db.list_due_fulfillments(&now).expect("due");
        assert_eq!(due.len(), 1);

        assert!(db.mark_donation_fulfilled(donation.id).expect("fulfill"));
        // Not due again once fulfilled
        assert!(db.list_due_fulfillments(&now).expect("due").is_empty());
        // Email not due yet
        assert!(db.list_due_fulfillment_emails(&now).expect("emails").is_empty());

        let later = (Utc::now() + Duration::hours(2)).to_rfc3339();
        let due_emails = db.list_due_fulfillment_emails(&later).expect("emails");
        assert_eq!(due_emails.len(), 1);

        assert!(db.mark_donation_emailed(donation.id).expect("emailed"));
        assert!(!db.mark_donation_emailed(donation.id).expect("repeat"));
    }

    #[test]
    fn subscription_upsert_refreshes_period() {
        let (db, campaign_id) = db_with_campaign();
        let donation = db
            .create_donation(
                "don-1",
                "cs_test_1",
                campaign_id,
                None,
                Some("omar@example.com"),
                1000,
                "usd",
                "monthly",
                0,
            )
            .expect("donation");

        let first = db
            .upsert_subscription("sub_1", donation.id, Some("cus_1"), 1000, "usd", Some("2026-09-01T00:00:00Z"))
            .expect("upsert");
        assert_eq!(first.status, "active");

        let renewed = db
            .upsert_subscription("sub_1", donation.id, Some("cus_1"), 1000, "usd", Some("2026-10-01T00:00:00Z"))
            .expect("upsert");
        assert_eq!(renewed.id, first.id);
        assert_eq!(renewed.current_period_end.as_deref(), Some("2026-10-01T00:00:00Z"));

        assert!(db.set_subscription_status("sub_1", "canceled").expect("cancel"));
        let fetched = db.get_subscription("sub_1").expect("get").expect("exists");
        assert_eq!(fetched.status, "canceled");
    }
}
