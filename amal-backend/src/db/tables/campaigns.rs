//! Campaign database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::{Campaign, CreateCampaignRequest, UpdateCampaignRequest};

const CAMPAIGN_COLUMNS: &str =
    "id, slug, title, description, image_url, goal_cents, raised_cents, currency,
     category_id, donation_type, fulfillment_kind, window_start, window_end,
     featured, archived, created_at, updated_at";

impl Database {
    pub fn create_campaign(&self, req: &CreateCampaignRequest) -> SqliteResult<Campaign> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO campaigns (slug, title, description, image_url, goal_cents, currency,
                                    category_id, donation_type, fulfillment_kind, window_start,
                                    window_end, featured, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            rusqlite::params![
                req.slug,
                req.title,
                req.description,
                req.image_url,
                req.goal_cents,
                req.currency,
                req.category_id,
                req.donation_type,
                req.fulfillment_kind,
                req.window_start,
                req.window_end,
                req.featured as i32,
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM campaigns WHERE id = ?1", CAMPAIGN_COLUMNS),
            [id],
            map_campaign_row,
        )
    }

    pub fn get_campaign(&self, id: i64) -> SqliteResult<Option<Campaign>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM campaigns WHERE id = ?1", CAMPAIGN_COLUMNS),
            [id],
            map_campaign_row,
        )
        .optional()
    }

    pub fn get_campaign_by_slug(&self, slug: &str) -> SqliteResult<Option<Campaign>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM campaigns WHERE slug = ?1", CAMPAIGN_COLUMNS),
            [slug],
            map_campaign_row,
        )
        .optional()
    }

    /// List campaigns, optionally filtered by category and featured flag.
    /// Archived campaigns are excluded unless `include_archived` is set.
    pub fn list_campaigns(
        &self,
        category_id: Option<i64>,
        featured: Option<bool>,
        include_archived: bool,
    ) -> SqliteResult<Vec<Campaign>> {
        let conn = self.conn.lock().unwrap();

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if !include_archived {
            clauses.push("archived = 0".to_string());
        }
        if let Some(cid) = category_id {
            params.push(Box::new(cid));
            clauses.push(format!("category_id = ?{}", params.len()));
        }
        if let Some(f) = featured {
            params.push(Box::new(f as i32));
            clauses.push(format!("featured = ?{}", params.len()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let query = format!(
            "SELECT {} FROM campaigns {} ORDER BY featured DESC, created_at DESC",
            CAMPAIGN_COLUMNS, where_sql
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query)?;
        let campaigns = stmt
            .query_map(params_refs.as_slice(), map_campaign_row)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(campaigns)
    }

    /// Update a campaign. Returns None if the id doesn't exist.
    pub fn update_campaign(
        &self,
        id: i64,
        req: &UpdateCampaignRequest,
    ) -> SqliteResult<Option<Campaign>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let mut updates = vec!["updated_at = ?1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];

        macro_rules! set {
            ($field:ident) => {
                if let Some(ref v) = req.$field {
                    params.push(Box::new(v.clone()));
                    updates.push(format!(concat!(stringify!($field), " = ?{}"), params.len()));
                }
            };
        }

        set!(slug);
        set!(title);
        set!(description);
        set!(image_url);
        set!(goal_cents);
        set!(currency);
        set!(category_id);
        set!(donation_type);
        set!(fulfillment_kind);
        set!(window_start);
        set!(window_end);
        if let Some(v) = req.featured {
            params.push(Box::new(v as i32));
            updates.push(format!("featured = ?{}", params.len()));
        }

        params.push(Box::new(id));
        let query = format!(
            "UPDATE campaigns SET {} WHERE id = ?{}",
            updates.join(", "),
            params.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changed = conn.execute(&query, params_refs.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }

        conn.query_row(
            &format!("SELECT {} FROM campaigns WHERE id = ?1", CAMPAIGN_COLUMNS),
            [id],
            map_campaign_row,
        )
        .optional()
    }

    pub fn archive_campaign(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE campaigns SET archived = 1, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        Ok(changed > 0)
    }

    /// Adjust the running raised total. Negative deltas (refunds) floor at zero.
    pub fn increment_campaign_raised(&self, id: i64, delta_cents: i64) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE campaigns SET raised_cents = MAX(0, raised_cents + ?1), updated_at = ?2
             WHERE id = ?3",
            rusqlite::params![delta_cents, now, id],
        )?;
        Ok(())
    }
}

fn map_campaign_row(row: &rusqlite::Row) -> SqliteResult<Campaign> {
    Ok(Campaign {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        image_url: row.get(4)?,
        goal_cents: row.get(5)?,
        raised_cents: row.get(6)?,
        currency: row.get(7)?,
        category_id: row.get(8)?,
        donation_type: row.get(9)?,
        fulfillment_kind: row.get(10)?,
        window_start: row.get(11)?,
        window_end: row.get(12)?,
        featured: row.get::<_, i32>(13)? != 0,
        archived: row.get::<_, i32>(14)? != 0,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::{CreateCampaignRequest, UpdateCampaignRequest};

    fn winter_relief() -> CreateCampaignRequest {
        CreateCampaignRequest {
            slug: "winter-relief".to_string(),
            title: "Winter Relief".to_string(),
            description: Some("Blankets and heating fuel".to_string()),
            image_url: None,
            goal_cents: Some(500_000),
            currency: "usd".to_string(),
            category_id: None,
            donation_type: "general".to_string(),
            fulfillment_kind: "standard".to_string(),
            window_start: None,
            window_end: None,
            featured: false,
        }
    }

    #[test]
    fn create_and_fetch_by_slug() {
        let db = Database::new(":memory:").expect("db");
        let created = db.create_campaign(&winter_relief()).expect("create");
        assert_eq!(created.raised_cents, 0);
        assert!(!created.archived);

        let fetched = db
            .get_campaign_by_slug("winter-relief")
            .expect("query")
            .expect("exists");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, "Winter Relief");
    }

    #[test]
    fn update_changes_only_given_fields() {
        let db = Database::new(":memory:").expect("db");
        let created = db.create_campaign(&winter_relief()).expect("create");

        let updated = db
            .update_campaign(
                created.id,
                &UpdateCampaignRequest {
                    slug: None,
                    title: Some("Winter Relief 2026".to_string()),
                    description: None,
                    image_url: None,
                    goal_cents: None,
                    currency: None,
                    category_id: None,
                    donation_type: None,
                    fulfillment_kind: None,
                    window_start: None,
                    window_end: None,
                    featured: Some(true),
                },
            )
            .expect("update")
            .expect("exists");

        assert_eq!(updated.title, "Winter Relief 2026");
        assert!(updated.featured);
        assert_eq!(updated.description.as_deref(), Some("Blankets and heating fuel"));
    }

    #[test]
    fn archived_campaigns_hidden_from_default_listing() {
        let db = Database::new(":memory:").expect("db");
        let created = db.create_campaign(&winter_relief()).expect("create");
        assert!(db.archive_campaign(created.id).expect("archive"));

        assert!(db.list_campaigns(None, None, false).expect("list").is_empty());
        assert_eq!(db.list_campaigns(None, None, true).expect("list").len(), 1);
    }

    #[test]
    fn raised_total_floors_at_zero() {
        let db = Database::new(":memory:").expect("db");
        let created = db.create_campaign(&winter_relief()).expect("create");

        db.increment_campaign_raised(created.id, 2500).expect("add");
        db.increment_campaign_raised(created.id, -5000).expect("refund");

        let fetched = db.get_campaign(created.id).expect("query").expect("exists");
        assert_eq!(fetched.raised_cents, 0);
    }
}
