//! SQLite persistence for sessions and the menu catalog

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::application::errors::StorageError;
use crate::domain::entities::{ChatSession, MenuItem};
use crate::domain::traits::{ChatSessionRepository, MenuRepository};

/// Raw `menu_items` row, validated into a `MenuItem` outside the rusqlite closure
type MenuRow = (String, String, String, i64, String, bool, Option<String>);

const MENU_COLUMNS: &str = "id, name, description, price_cents, category, available, image_url";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file. The menu table is seeded with
    /// `catalog` only when it is empty.
    pub fn open(path: impl AsRef<Path>, catalog: &[MenuItem]) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, catalog)
    }

    pub fn open_in_memory(catalog: &[MenuItem]) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, catalog)
    }

    fn with_connection(conn: Connection, catalog: &[MenuItem]) -> Result<Self, StorageError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        store.seed_menu(catalog)?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_sessions (
                phone_number TEXT PRIMARY KEY,
                id TEXT NOT NULL,
                state TEXT NOT NULL,
                data TEXT NOT NULL,
                last_message_time INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS menu_items (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                price_cents INTEGER NOT NULL,
                category TEXT NOT NULL,
                available INTEGER NOT NULL DEFAULT 1,
                image_url TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chat_sessions_last_message ON chat_sessions(last_message_time)",
            [],
        )?;

        Ok(())
    }

    fn seed_menu(&self, catalog: &[MenuItem]) -> Result<(), StorageError> {
        let mut conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM menu_items", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let tx = conn.transaction()?;
        for (position, item) in catalog.iter().enumerate() {
            tx.execute(
                "INSERT INTO menu_items (id, position, name, description, price_cents, category, available, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    item.id(),
                    position as i64,
                    item.name(),
                    item.description(),
                    item.price_cents(),
                    item.category(),
                    item.is_available(),
                    item.image_url(),
                ],
            )?;
        }
        tx.commit()?;

        tracing::info!("Seeded menu with {} items", catalog.len());
        Ok(())
    }

    fn query_menu(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<MenuItem>, StorageError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM menu_items {} ORDER BY position", MENU_COLUMNS, filter);
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(args, |row| -> rusqlite::Result<MenuRow> {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(menu_item(row?)?);
        }
        Ok(items)
    }
}

fn menu_item(row: MenuRow) -> Result<MenuItem, StorageError> {
    let (id, name, description, price_cents, category, available, image_url) = row;
    let row_id = id.clone();
    MenuItem::create(id, name, description, price_cents, category, available, image_url)
        .map_err(|e| StorageError::Serialization(format!("menu item {}: {}", row_id, e)))
}

fn expiry_cutoff_ms(timeout_ms: u64) -> i64 {
    Utc::now()
        .timestamp_millis()
        .saturating_sub(i64::try_from(timeout_ms).unwrap_or(i64::MAX))
}

#[async_trait]
impl ChatSessionRepository for SqliteStore {
    async fn save(&self, session: &ChatSession) -> Result<(), StorageError> {
        let data = serde_json::to_string(session)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO chat_sessions (phone_number, id, state, data, last_message_time, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.phone_number(),
                session.id(),
                session.state().as_str(),
                data,
                session.context().last_message_time.timestamp_millis(),
                session.updated_at().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<ChatSession>, StorageError> {
        let data: Option<String> = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT data FROM chat_sessions WHERE phone_number = ?1",
                [phone_number],
                |row| row.get(0),
            )
            .optional()?
        };

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, phone_number: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM chat_sessions WHERE phone_number = ?1", [phone_number])?;
        Ok(())
    }

    async fn find_expired_sessions(&self, timeout_ms: u64) -> Result<Vec<ChatSession>, StorageError> {
        let rows: Vec<String> = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare("SELECT data FROM chat_sessions WHERE last_message_time < ?1")?;
            let rows = stmt.query_map([expiry_cutoff_ms(timeout_ms)], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<_, _>>()?
        };

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(StorageError::from))
            .collect()
    }

    async fn delete_expired_sessions(&self, timeout_ms: u64) -> Result<usize, StorageError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM chat_sessions WHERE last_message_time < ?1",
            [expiry_cutoff_ms(timeout_ms)],
        )?;
        Ok(removed)
    }
}

#[async_trait]
impl MenuRepository for SqliteStore {
    async fn find_all_items(&self) -> Result<Vec<MenuItem>, StorageError> {
        self.query_menu("", &[])
    }

    async fn find_items_by_category(&self, category: &str) -> Result<Vec<MenuItem>, StorageError> {
        // LOWER() only folds ASCII, so compare in Rust to cover accented names
        let wanted = category.to_lowercase();
        Ok(self
            .query_menu("WHERE available = 1", &[])?
            .into_iter()
            .filter(|i| i.category().to_lowercase() == wanted)
            .collect())
    }

    async fn find_item_by_id(&self, id: &str) -> Result<Option<MenuItem>, StorageError> {
        Ok(self.query_menu("WHERE id = ?1", &[&id])?.into_iter().next())
    }

    async fn find_available_items(&self) -> Result<Vec<MenuItem>, StorageError> {
        self.query_menu("WHERE available = 1", &[])
    }

    async fn get_categories(&self) -> Result<Vec<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT category FROM menu_items WHERE available = 1")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut categories = rows.collect::<Result<Vec<_>, _>>()?;
        categories.sort();
        Ok(categories)
    }
}
