//! Mega-menu and widget database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use super::super::Database;
use crate::models::{
    CreateMenuRequest, CreateWidgetRequest, MegaMenu, MenuWidget, MenuWithWidgets,
    UpdateMenuRequest, UpdateWidgetRequest,
};

const MENU_COLUMNS: &str = "id, title, slug, position, enabled, created_at, updated_at";
const WIDGET_COLUMNS: &str =
    "id, menu_id, widget_type, title, campaign_id, link_url, image_url, position, created_at, updated_at";

impl Database {
    pub fn create_menu(&self, req: &CreateMenuRequest) -> SqliteResult<MegaMenu> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO mega_menus (title, slug, position, enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![req.title, req.slug, req.position, req.enabled as i32, now],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM mega_menus WHERE id = ?1", MENU_COLUMNS),
            [id],
            map_menu_row,
        )
    }

    pub fn get_menu(&self, id: i64) -> SqliteResult<Option<MegaMenu>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM mega_menus WHERE id = ?1", MENU_COLUMNS),
            [id],
            map_menu_row,
        )
        .optional()
    }

    /// List menus with their widgets nested, for the storefront nav.
    pub fn list_menus_with_widgets(&self, include_disabled: bool) -> SqliteResult<Vec<MenuWithWidgets>> {
        let conn = self.conn.lock().unwrap();

        let menu_query = if include_disabled {
            format!("SELECT {} FROM mega_menus ORDER BY position, id", MENU_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM mega_menus WHERE enabled = 1 ORDER BY position, id",
                MENU_COLUMNS
            )
        };
        let mut stmt = conn.prepare(&menu_query)?;
        let menus: Vec<MegaMenu> = stmt
            .query_map([], map_menu_row)?
            .filter_map(|r| r.ok())
            .collect();

        let mut widget_stmt = conn.prepare(&format!(
            "SELECT {} FROM menu_widgets WHERE menu_id = ?1 ORDER BY position, id",
            WIDGET_COLUMNS
        ))?;

        let mut result = Vec::with_capacity(menus.len());
        for menu in menus {
            let widgets = widget_stmt
                .query_map([menu.id], map_widget_row)?
                .filter_map(|r| r.ok())
                .collect();
            result.push(MenuWithWidgets { menu, widgets });
        }

        Ok(result)
    }

    pub fn update_menu(&self, id: i64, req: &UpdateMenuRequest) -> SqliteResult<Option<MegaMenu>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let mut updates = vec!["updated_at = ?1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];

        if let Some(ref v) = req.title {
            params.push(Box::new(v.clone()));
            updates.push(format!("title = ?{}", params.len()));
        }
        if let Some(ref v) = req.slug {
            params.push(Box::new(v.clone()));
            updates.push(format!("slug = ?{}", params.len()));
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
            "UPDATE mega_menus SET {} WHERE id = ?{}",
            updates.join(", "),
            params.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changed = conn.execute(&query, params_refs.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }

        conn.query_row(
            &format!("SELECT {} FROM mega_menus WHERE id = ?1", MENU_COLUMNS),
            [id],
            map_menu_row,
        )
        .optional()
    }

    /// Delete a menu and (via FK cascade) its widgets.
    pub fn delete_menu(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        // Cascade manually; the connection may not have foreign_keys pragma on
        conn.execute("DELETE FROM menu_widgets WHERE menu_id = ?1", [id])?;
        let changed = conn.execute("DELETE FROM mega_menus WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn create_widget(&self, menu_id: i64, req: &CreateWidgetRequest) -> SqliteResult<MenuWidget> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO menu_widgets (menu_id, widget_type, title, campaign_id, link_url,
                                       image_url, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            rusqlite::params![
                menu_id,
                req.widget_type,
                req.title,
                req.campaign_id,
                req.link_url,
                req.image_url,
                req.position,
                now,
            ],
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {} FROM menu_widgets WHERE id = ?1", WIDGET_COLUMNS),
            [id],
            map_widget_row,
        )
    }

    pub fn update_widget(
        &self,
        id: i64,
        req: &UpdateWidgetRequest,
    ) -> SqliteResult<Option<MenuWidget>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let mut updates = vec!["updated_at = ?1".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];

        if let Some(ref v) = req.widget_type {
            params.push(Box::new(v.clone()));
            updates.push(format!("widget_type = ?{}", params.len()));
        }
        if let Some(ref v) = req.title {
            params.push(Box::new(v.clone()));
            updates.push(format!("title = ?{}", params.len()));
        }
        if let Some(v) = req.campaign_id {
            params.push(Box::new(v));
            updates.push(format!("campaign_id = ?{}", params.len()));
        }
        if let Some(ref v) = req.link_url {
            params.push(Box::new(v.clone()));
            updates.push(format!("link_url = ?{}", params.len()));
        }
        if let Some(ref v) = req.image_url {
            params.push(Box::new(v.clone()));
            updates.push(format!("image_url = ?{}", params.len()));
        }
        if let Some(v) = req.position {
            params.push(Box::new(v));
            updates.push(format!("position = ?{}", params.len()));
        }

        params.push(Box::new(id));
        let query = format!(
            "UPDATE menu_widgets SET {} WHERE id = ?{}",
            updates.join(", "),
            params.len()
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let changed = conn.execute(&query, params_refs.as_slice())?;
        if changed == 0 {
            return Ok(None);
        }

        conn.query_row(
            &format!("SELECT {} FROM menu_widgets WHERE id = ?1", WIDGET_COLUMNS),
            [id],
            map_widget_row,
        )
        .optional()
    }

    pub fn delete_widget(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM menu_widgets WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}

fn map_menu_row(row: &rusqlite::Row) -> SqliteResult<MegaMenu> {
    Ok(MegaMenu {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        position: row.get(3)?,
        enabled: row.get::<_, i32>(4)? != 0,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_widget_row(row: &rusqlite::Row) -> SqliteResult<MenuWidget> {
    Ok(MenuWidget {
        id: row.get(0)?,
        menu_id: row.get(1)?,
        widget_type: row.get(2)?,
        title: row.get(3)?,
        campaign_id: row.get(4)?,
        link_url: row.get(5)?,
        image_url: row.get(6)?,
        position: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::{CreateMenuRequest, CreateWidgetRequest};

    #[test]
    fn menu_with_widgets_round_trip() {
        let db = Database::new(":memory:").expect("db");
        let menu = db
            .create_menu(&CreateMenuRequest {
                title: "Appeals".to_string(),
                slug: "appeals".to_string(),
                position: 0,
                enabled: true,
            })
            .expect("create menu");

        db.create_widget(
            menu.id,
            &CreateWidgetRequest {
                widget_type: "link".to_string(),
                title: "Emergency".to_string(),
                campaign_id: None,
                link_url: Some("/appeals/emergency".to_string()),
                image_url: None,
                position: 1,
            },
        )
        .expect("create widget");

        let menus = db.list_menus_with_widgets(false).expect("list");
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].widgets.len(), 1);
        assert_eq!(menus[0].widgets[0].title, "Emergency");
    }

    #[test]
    fn deleting_menu_removes_widgets() {
        let db = Database::new(":memory:").expect("db");
        let menu = db
            .create_menu(&CreateMenuRequest {
                title: "Appeals".to_string(),
                slug: "appeals".to_string(),
                position: 0,
                enabled: true,
            })
            .expect("create menu");
        db.create_widget(
            menu.id,
            &CreateWidgetRequest {
                widget_type: "link".to_string(),
                title: "Emergency".to_string(),
                campaign_id: None,
                link_url: None,
                image_url: None,
                position: 0,
            },
        )
        .expect("create widget");

        assert!(db.delete_menu(menu.id).expect("delete"));
        assert!(db.list_menus_with_widgets(true).expect("list").is_empty());
    }
}
