//! Site settings database operations (single-row table)

use chrono::Utc;
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::{SiteSettings, UpdateSiteSettingsRequest};

const SETTINGS_COLUMNS: &str =
    "id, org_name, contact_email, logo_url, stripe_publishable_key, social_links, announcement, updated_at";

impl Database {
    /// Get the settings row, creating it with defaults on first access.
    pub fn get_or_create_site_settings(&self) -> SqliteResult<SiteSettings> {
        let conn = self.conn.lock().unwrap();

        let existing = conn
            .query_row(
                &format!(
                    "SELECT {} FROM site_settings ORDER BY id LIMIT 1",
                    SETTINGS_COLUMNS
                ),
                [],
                map_settings_row,
            )
            .ok();

        if let Some(settings) = existing {
            return Ok(settings);
        }

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO site_settings (updated_at) VALUES (?1)",
            [&now],
        )?;
        let id = conn.last_insert_rowid();

        conn.query_row(
            &format!("SELECT {} FROM site_settings WHERE id = ?1", SETTINGS_COLUMNS),
            [id],
            map_settings_row,
        )
    }

    pub fn update_site_settings(
        &self,
        req: &UpdateSiteSettingsRequest,
    ) -> SqliteResult<SiteSettings> {
        // Ensure the row exists before updating it
        let current = self.get_or_create_site_settings()?;

        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let mut updates = vec!["updated_at = ?1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];

        if let Some(ref v) = req.org_name {
            params.push(Box::new(v.clone()));
            updates.push(format!("org_name = ?{}", params.len()));
        }
        if let Some(ref v) = req.contact_email {
            params.push(Box::new(v.clone()));
            updates.push(format!("contact_email = ?{}", params.len()));
        }
        if let Some(ref v) = req.logo_url {
            params.push(Box::new(v.clone()));
            updates.push(format!("logo_url = ?{}", params.len()));
        }
        if let Some(ref v) = req.stripe_publishable_key {
            params.push(Box::new(v.clone()));
            updates.push(format!("stripe_publishable_key = ?{}", params.len()));
        }
        if let Some(ref v) = req.social_links {
            let json = serde_json::to_string(v).unwrap_or_else(|_| "{}".to_string());
            params.push(Box::new(json));
            updates.push(format!("social_links = ?{}", params.len()));
        }
        if let Some(ref v) = req.announcement {
            params.push(Box::new(v.clone()));
            updates.push(format!("announcement = ?{}", params.len()));
        }

        params.push(Box::new(current.id));
        let query = format!(
            "UPDATE site_settings SET {} WHERE id = ?{}",
            updates.join(", "),
            params.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.execute(&query, params_refs.as_slice())?;

        conn.query_row(
            &format!("SELECT {} FROM site_settings WHERE id = ?1", SETTINGS_COLUMNS),
            [current.id],
            map_settings_row,
        )
    }
}

fn map_settings_row(row: &rusqlite::Row) -> SqliteResult<SiteSettings> {
    let social_json: String = row.get(5)?;
    Ok(SiteSettings {
        id: row.get(0)?,
        org_name: row.get(1)?,
        contact_email: row.get(2)?,
        logo_url: row.get(3)?,
        stripe_publishable_key: row.get(4)?,
        social_links: serde_json::from_str(&social_json)
            .unwrap_or_else(|_| serde_json::json!({})),
        announcement: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::UpdateSiteSettingsRequest;

    #[test]
    fn first_access_creates_default_row() {
        let db = Database::new(":memory:").expect("db");
        let settings = db.get_or_create_site_settings().expect("settings");
        assert_eq!(settings.org_name, "Amal Relief");

        let again = db.get_or_create_site_settings().expect("settings");
        assert_eq!(again.id, settings.id);
    }

    #[test]
    fn update_merges_fields() {
        let db = Database::new(":memory:").expect("db");
        let updated = db
            .update_site_settings(&UpdateSiteSettingsRequest {
                org_name: Some("Amal Relief UK".to_string()),
                contact_email: Some("hello@amalrelief.org".to_string()),
                logo_url: None,
                stripe_publishable_key: None,
                social_links: Some(serde_json::json!({"x": "https://x.com/amalrelief"})),
                announcement: None,
            })
            .expect("update");

        assert_eq!(updated.org_name, "Amal Relief UK");
        assert_eq!(updated.social_links["x"], "https://x.com/amalrelief");
    }
}
