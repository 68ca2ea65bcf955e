//! Category database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::{Category, CreateCategoryRequest, UpdateCategoryRequest};

impl Database {
    pub fn create_category(&self, req: &CreateCategoryRequest) -> SqliteResult<Category> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO categories (slug, name, description, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![req.slug, req.name, req.description, req.position, now],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, slug, name, description, position, archived, created_at, updated_at
             FROM categories WHERE id = ?1",
            [id],
            map_category_row,
        )
    }

    pub fn get_category(&self, id: i64) -> SqliteResult<Option<Category>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, slug, name, description, position, archived, created_at, updated_at
             FROM categories WHERE id = ?1",
            [id],
            map_category_row,
        )
        .optional()
    }

    pub fn list_categories(&self, include_archived: bool) -> SqliteResult<Vec<Category>> {
        let conn = self.conn.lock().unwrap();
        let query = if include_archived {
            "SELECT id, slug, name, description, position, archived, created_at, updated_at
             FROM categories ORDER BY position, name"
        } else {
            "SELECT id, slug, name, description, position, archived, created_at, updated_at
             FROM categories WHERE archived = 0 ORDER BY position, name"
        };

        let mut stmt = conn.prepare(query)?;
        let categories = stmt
            .query_map([], map_category_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(categories)
    }

    pub fn update_category(
        &self,
        id: i64,
        req: &UpdateCategoryRequest,
    ) -> SqliteResult<Option<Category>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let mut updates = vec!["updated_at = ?1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];

        if let Some(ref v) = req.slug {
            params.push(Box::new(v.clone()));
            updates.push(format!("slug = ?{}", params.len()));
        }
        if let Some(ref v) = req.name {
            params.push(Box::new(v.clone()));
            updates.push(format!("name = ?{}", params.len()));
        }
        if let Some(ref v) = req.description {
            params.push(Box::new(v.clone()));
            updates.push(format!("description = ?{}", params.len()));
        }
        if let Some(v) = req.position {
            params.push(Box::new(v));
            updates.push(format!("position = ?{}", params.len()));
        }

        params.push(Box::new(id));
        let query = format!(
            "UPDATE categories SET {} WHERE id = ?{}",
            updates.join(", "),
            params.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changed = conn.execute(&query, params_refs.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }

        conn.query_row(
            "SELECT id, slug, name, description, position, archived, created_at, updated_at
             FROM categories WHERE id = ?1",
            [id],
            map_category_row,
        )
        .optional()
    }

    pub fn archive_category(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE categories SET archived = 1, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        Ok(changed > 0)
    }
}

fn map_category_row(row: &rusqlite::Row) -> SqliteResult<Category> {
    Ok(Category {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        position: row.get(4)?,
        archived: row.get::<_, i32>(5)? != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
