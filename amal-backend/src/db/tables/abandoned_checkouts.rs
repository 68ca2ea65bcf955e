//! Abandoned checkout database operations (recovery funnel state)

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::AbandonedCheckout;

const CHECKOUT_COLUMNS: &str =
    "id, checkout_session_id, campaign_id, email, amount_cents, currency, frequency,
     status, emails_sent, last_email_at, last_activity_at, abandoned_at, created_at, updated_at";

impl Database {
    pub fn create_abandoned_checkout(
        &self,
        checkout_session_id: &str,
        campaign_id: i64,
        email: &str,
        amount_cents: i64,
        currency: &str,
        frequency: &str,
    ) -> SqliteResult<AbandonedCheckout> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO abandoned_checkouts (checkout_session_id, campaign_id, email,
                                              amount_cents, currency, frequency,
                                              last_activity_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?7)",
            rusqlite::params![
                checkout_session_id,
                campaign_id,
                email,
                amount_cents,
                currency,
                frequency,
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM abandoned_checkouts WHERE id = ?1", CHECKOUT_COLUMNS),
            [id],
            map_checkout_row,
        )
    }

    pub fn get_checkout_by_session(
        &self,
        checkout_session_id: &str,
    ) -> SqliteResult<Option<AbandonedCheckout>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT {} FROM abandoned_checkouts WHERE checkout_session_id = ?1",
                CHECKOUT_COLUMNS
            ),
            [checkout_session_id],
            map_checkout_row,
        )
        .optional()
    }

    /// Heartbeat from the checkout page. Only open checkouts are touched.
    pub fn touch_checkout_activity(&self, checkout_session_id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE abandoned_checkouts SET last_activity_at = ?1, updated_at = ?1
             WHERE checkout_session_id = ?2 AND status = 'open'",
            rusqlite::params![now, checkout_session_id],
        )?;
        Ok(changed > 0)
    }

    /// Flip open checkouts inactive since `cutoff` to abandoned.
    /// Returns the number of rows transitioned.
    pub fn mark_inactive_abandoned(&self, cutoff: &str) -> SqliteResult<usize> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE abandoned_checkouts
             SET status = 'abandoned', abandoned_at = ?1, updated_at = ?1
             WHERE status = 'open' AND last_activity_at <= ?2",
            rusqlite::params![now, cutoff],
        )?;
        Ok(changed)
    }

    /// Immediate abandonment (processor told us the session expired).
    pub fn mark_checkout_abandoned(&self, checkout_session_id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE abandoned_checkouts
             SET status = 'abandoned', abandoned_at = ?1, updated_at = ?1
             WHERE checkout_session_id = ?2 AND status = 'open'",
            rusqlite::params![now, checkout_session_id],
        )?;
        Ok(changed > 0)
    }

    /// Close the funnel after a successful payment. A checkout that had
    /// received at least one recovery email counts as recovered; otherwise
    /// it completed on its own.
    pub fn complete_checkout(&self, checkout_session_id: &str) -> SqliteResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let row: Option<(i64, i32)> = conn
            .query_row(
                "SELECT id, emails_sent FROM abandoned_checkouts
                 WHERE checkout_session_id = ?1
                   AND status IN ('open', 'abandoned', 'exhausted')",
                [checkout_session_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (id, emails_sent) = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let new_status = if emails_sent > 0 { "recovered" } else { "completed" };
        conn.execute(
            "UPDATE abandoned_checkouts SET status = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![new_status, now, id],
        )?;

        Ok(Some(new_status.to_string()))
    }

    /// Abandoned checkouts that still have recovery emails left to send.
    pub fn list_recovery_candidates(&self, max_emails: i32) -> SqliteResult<Vec<AbandonedCheckout>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM abandoned_checkouts
             WHERE status = 'abandoned' AND emails_sent < ?1
             ORDER BY abandoned_at ASC",
            CHECKOUT_COLUMNS
        ))?;
        let checkouts = stmt
            .query_map([max_emails], map_checkout_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(checkouts)
    }

    /// Record a sent recovery email, flipping to exhausted after the last one.
    pub fn record_recovery_email(&self, id: i64, exhausted: bool) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        if exhausted {
            conn.execute(
                "UPDATE abandoned_checkouts
                 SET emails_sent = emails_sent + 1, last_email_at = ?1,
                     status = 'exhausted', updated_at = ?1
                 WHERE id = ?2",
                rusqlite::params![now, id],
            )?;
        } else {
            conn.execute(
                "UPDATE abandoned_checkouts
                 SET emails_sent = emails_sent + 1, last_email_at = ?1, updated_at = ?1
                 WHERE id = ?2",
                rusqlite::params![now, id],
            )?;
        }
        Ok(())
    }
}

fn map_checkout_row(row: &rusqlite::Row) -> SqliteResult<AbandonedCheckout> {
    Ok(AbandonedCheckout {
        id: row.get(0)?,
        checkout_session_id: row.get(1)?,
        campaign_id: row.get(2)?,
        email: row.get(3)?,
        amount_cents: row.get(4)?,
        currency: row.get(5)?,
        frequency: row.get(6)?,
        status: row.get(7)?,
        emails_sent: row.get(8)?,
        last_email_at: row.get(9)?,
        last_activity_at: row.get(10)?,
        abandoned_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::db::Database;
    use crate::models::CreateCampaignRequest;

    fn db_with_checkout() -> (Database, i64) {
        let db = Database::new(":memory:").expect("db");
        let campaign = db
            .create_campaign(&CreateCampaignRequest {
                slug: "water-wells".to_string(),
                title: "Water Wells".to_string(),
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
        let checkout = db
            .create_abandoned_checkout("cs_test_1", campaign.id, "fatima@example.com", 10_000, "usd", "once")
            .expect("checkout");
        (db, checkout.id)
    }

    #[test]
    fn inactivity_sweep_only_hits_stale_open_rows() {
        let (db, _) = db_with_checkout();

        // Cutoff in the past: the fresh row is still active
        let past_cutoff = (Utc::now() - Duration::minutes(30)).to_rfc3339();
        assert_eq!(db.mark_inactive_abandoned(&past_cutoff).expect("sweep"), 0);

        // Cutoff in the future covers the row
        let future_cutoff = (Utc::now() + Duration::minutes(1)).to_rfc3339();
        assert_eq!(db.mark_inactive_abandoned(&future_cutoff).expect("sweep"), 1);

        // Already abandoned: second sweep is a no-op
        assert_eq!(db.mark_inactive_abandoned(&future_cutoff).expect("sweep"), 0);
    }

    #[test]
    fn activity_heartbeat_ignores_closed_checkouts() {
        let (db, _) = db_with_checkout();
        assert!(db.touch_checkout_activity("cs_test_1").expect("touch"));

        db.mark_checkout_abandoned("cs_test_1").expect("abandon");
        assert!(!db.touch_checkout_activity("cs_test_1").expect("touch"));
    }

    #[test]
    fn completion_distinguishes_recovered_from_completed() {
        let (db, id) = db_with_checkout();

        db.mark_checkout_abandoned("cs_test_1").expect("abandon");
        db.record_recovery_email(id, false).expect("email");

        let status = db.complete_checkout("cs_test_1").expect("complete");
        assert_eq!(status.as_deref(), Some("recovered"));
    }

    #[test]
    fn completion_without_emails_is_plain_completed() {
        let (db, _) = db_with_checkout();
        let status = db.complete_checkout("cs_test_1").expect("complete");
        assert_eq!(status.as_deref(), Some("completed"));

        // Already closed: nothing to do
        assert!(db.complete_checkout("cs_test_1").expect("complete").is_none());
    }

    #[test]
    fn exhaustion_removes_from_candidates() {
        let (db, id) = db_with_checkout();
        db.mark_checkout_abandoned("cs_test_1").expect("abandon");

        assert_eq!(db.list_recovery_candidates(5).expect("list").len(), 1);
        db.record_recovery_email(id, true).expect("email");
        assert!(db.list_recovery_candidates(5).expect("list").is_empty());
    }
}
