use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if database_url != ":memory:" {
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).ok();
                }
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                position INTEGER NOT NULL DEFAULT 0,
                archived INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS campaigns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT UNIQUE NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                image_url TEXT,
                goal_cents INTEGER,
                raised_cents INTEGER NOT NULL DEFAULT 0,
                currency TEXT NOT NULL DEFAULT 'usd',
                category_id INTEGER REFERENCES categories(id),
                donation_type TEXT NOT NULL DEFAULT 'general',
                fulfillment_kind TEXT NOT NULL DEFAULT 'standard',
                window_start TEXT,
                window_end TEXT,
                featured INTEGER NOT NULL DEFAULT 0,
                archived INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS mega_menus (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS menu_widgets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                menu_id INTEGER NOT NULL REFERENCES mega_menus(id) ON DELETE CASCADE,
                widget_type TEXT NOT NULL,
                title TEXT NOT NULL,
                campaign_id INTEGER REFERENCES campaigns(id),
                link_url TEXT,
                image_url TEXT,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS homepage_sections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                section_type TEXT NOT NULL,
                title TEXT,
                subtitle TEXT,
                campaign_ids TEXT NOT NULL DEFAULT '[]',
                position INTEGER NOT NULL DEFAULT 0,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS site_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                org_name TEXT NOT NULL DEFAULT 'Amal Relief',
                contact_email TEXT,
                logo_url TEXT,
                stripe_publishable_key TEXT,
                social_links TEXT NOT NULL DEFAULT '{}',
                announcement TEXT,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS donations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                donation_id TEXT UNIQUE NOT NULL,
                checkout_session_id TEXT UNIQUE NOT NULL,
                payment_intent_id TEXT,
                campaign_id INTEGER NOT NULL REFERENCES campaigns(id),
                donor_name TEXT,
                donor_email TEXT,
                amount_cents INTEGER NOT NULL,
                currency TEXT NOT NULL DEFAULT 'usd',
                frequency TEXT NOT NULL DEFAULT 'once',
                payment_status TEXT NOT NULL DEFAULT 'pending',
                fulfillment_status TEXT NOT NULL DEFAULT 'pending',
                fulfill_at TEXT,
                email_at TEXT,
                tz_offset_minutes INTEGER NOT NULL DEFAULT 0,
                paid_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS donation_subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subscription_id TEXT UNIQUE NOT NULL,
                donation_id INTEGER NOT NULL REFERENCES donations(id),
                customer_id TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                amount_cents INTEGER NOT NULL,
                currency TEXT NOT NULL DEFAULT 'usd',
                current_period_end TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // The insert into this table doubles as the webhook idempotency
        // guard: INSERT OR IGNORE, zero rows changed means already handled.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS webhook_events (
                event_id TEXT PRIMARY KEY,
                event_type TEXT NOT NULL,
                received_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS abandoned_checkouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                checkout_session_id TEXT UNIQUE NOT NULL,
                campaign_id INTEGER NOT NULL REFERENCES campaigns(id),
                email TEXT NOT NULL,
                amount_cents INTEGER NOT NULL,
                currency TEXT NOT NULL DEFAULT 'usd',
                frequency TEXT NOT NULL DEFAULT 'once',
                status TEXT NOT NULL DEFAULT 'open',
                emails_sent INTEGER NOT NULL DEFAULT 0,
                last_email_at TEXT,
                last_activity_at TEXT NOT NULL,
                abandoned_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS leads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                email TEXT NOT NULL,
                phone TEXT,
                source TEXT,
                crm_contact_id TEXT,
                synced INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Poll queries hit these constantly
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_donations_fulfillment
             ON donations (fulfillment_status, fulfill_at)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_checkouts_status
             ON abandoned_checkouts (status, last_activity_at)",
            [],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("amal.db");
        let db = Database::new(path.to_str().unwrap()).expect("open db");
        drop(db);
        assert!(path.exists());
    }

    #[test]
    fn init_is_idempotent() {
        let db = Database::new(":memory:").expect("open db");
        db.init().expect("re-init");
    }
}
