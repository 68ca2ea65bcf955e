//! Homepage section database operations
//!
//! `campaign_ids` is a JSON array column; rows with unparseable JSON map to
//! an empty list rather than failing the whole query.

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::{CreateSectionRequest, HomepageSection, UpdateSectionRequest};

const SECTION_COLUMNS: &str =
    "id, section_type, title, subtitle, campaign_ids, position, enabled, created_at, updated_at";

impl Database {
    pub fn create_section(&self, req: &CreateSectionRequest) -> SqliteResult<HomepageSection> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let ids_json = serde_json::to_string(&req.campaign_ids).unwrap_or_else(|_| "[]".to_string());

        conn.execute(
            "INSERT INTO homepage_sections (section_type, title, subtitle, campaign_ids,
                                            position, enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
                req.section_type,
                req.title,
                req.subtitle,
                ids_json,
                req.position,
                req.enabled as i32,
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM homepage_sections WHERE id = ?1", SECTION_COLUMNS),
            [id],
            map_section_row,
        )
    }

    pub fn list_sections(&self, enabled_only: bool) -> SqliteResult<Vec<HomepageSection>> {
        let conn = self.conn.lock().unwrap();
        let query = if enabled_only {
            format!(
                "SELECT {} FROM homepage_sections WHERE enabled = 1 ORDER BY position, id",
                SECTION_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM homepage_sections ORDER BY position, id",
                SECTION_COLUMNS
            )
        };

        let mut stmt = conn.prepare(&query)?;
        let sections = stmt
            .query_map([], map_section_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(sections)
    }

    pub fn update_section(
        &self,
        id: i64,
        req: &UpdateSectionRequest,
    ) -> SqliteResult<Option<HomepageSection>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let mut updates = vec!["updated_at = ?1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];

        if let Some(ref v) = req.section_type {
            params.push(Box::new(v.clone()));
            updates.push(format!("section_type = ?{}", params.len()));
        }
        if let Some(ref v) = req.title {
            params.push(Box::new(v.clone()));
            updates.push(format!("title = ?{}", params.len()));
        }
        if let Some(ref v) = req.subtitle {
            params.push(Box::new(v.clone()));
            updates.push(format!("subtitle = ?{}", params.len()));
        }
        if let Some(ref v) = req.campaign_ids {
            let ids_json = serde_json::to_string(v).unwrap_or_else(|_| "[]".to_string());
            params.push(Box::new(ids_json));
            updates.push(format!("campaign_ids = ?{}", params.len()));
        }
        if let Some(v) = req.position {
            params.push(Box::new(v));
            updates.push(format!("position = ?{}", params.len()));
        }
        if let Some(v) = req.enabled {
            params.push(Box::new(v as i32));
            updates.push(format!("enabled = ?{}", params.len()));
        }

        params.push(Box::new(id));
        let query = format!(
            "UPDATE homepage_sections SET {} WHERE id = ?{}",
            updates.join(", "),
            params.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changed = conn.execute(&query, params_refs.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }

        conn.query_row(
            &format!("SELECT {} FROM homepage_sections WHERE id = ?1", SECTION_COLUMNS),
            [id],
            map_section_row,
        )
        .optional()
    }

    pub fn delete_section(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM homepage_sections WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}

fn map_section_row(row: &rusqlite::Row) -> SqliteResult<HomepageSection> {
    let ids_json: String = row.get(4)?;
    Ok(HomepageSection {
        id: row.get(0)?,
        section_type: row.get(1)?,
        title: row.get(2)?,
        subtitle: row.get(3)?,
        campaign_ids: serde_json::from_str(&ids_json).unwrap_or_default(),
        position: row.get(5)?,
        enabled: row.get::<_, i32>(6)? != 0,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::CreateSectionRequest;

    #[test]
    fn campaign_ids_survive_round_trip() {
        let db = Database::new(":memory:").expect("db");
        db.create_section(&CreateSectionRequest {
            section_type: "featured".to_string(),
            title: Some("Featured appeals".to_string()),
            subtitle: None,
            campaign_ids: vec![3, 1, 7],
            position: 0,
            enabled: true,
        })
        .expect("create");

        let sections = db.list_sections(true).expect("list");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].campaign_ids, vec![3, 1, 7]);
    }
}
