//! Lead database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::Lead;

const LEAD_COLUMNS: &str = "id, name, email, phone, source, crm_contact_id, synced, created_at";

impl Database {
    pub fn create_lead(
        &self,
        name: Option<&str>,
        email: &str,
        phone: Option<&str>,
        source: Option<&str>,
    ) -> SqliteResult<Lead> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO leads (name, email, phone, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![name, email, phone, source, now],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM leads WHERE id = ?1", LEAD_COLUMNS),
            [id],
            map_lead_row,
        )
    }

    pub fn get_lead(&self, id: i64) -> SqliteResult<Option<Lead>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM leads WHERE id = ?1", LEAD_COLUMNS),
            [id],
            map_lead_row,
        )
        .optional()
    }

    /// Stamp the CRM contact id once the sync succeeds.
    pub fn mark_lead_synced(&self, id: i64, crm_contact_id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE leads SET synced = 1, crm_contact_id = ?1 WHERE id = ?2",
            rusqlite::params![crm_contact_id, id],
        )?;
        Ok(changed > 0)
    }
}

fn map_lead_row(row: &rusqlite::Row) -> SqliteResult<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        source: row.get(4)?,
        crm_contact_id: row.get(5)?,
        synced: row.get::<_, i32>(6)? != 0,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[test]
    fn lead_sync_stamps_contact_id() {
        let db = Database::new(":memory:").expect("db");
        let lead = db
            .create_lead(Some("Yusuf"), "yusuf@example.com", None, Some("newsletter"))
            .expect("lead");
        assert!(!lead.synced);

        assert!(db.mark_lead_synced(lead.id, "ghl_abc123").expect("sync"));
        let fetched = db.get_lead(lead.id).expect("get").expect("exists");
        assert!(fetched.synced);
        assert_eq!(fetched.crm_contact_id.as_deref(), Some("ghl_abc123"));
    }
}
