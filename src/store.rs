//! SQLite-backed menu store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::schema::MenuTag;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A row about to be inserted by the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    /// Integer minor-unit currency amount (yen).
    pub price: i64,
    /// ISO `YYYY-MM-DD`, kept as text to preserve explicit dates verbatim.
    pub available_date: String,
    pub tag: Option<MenuTag>,
}

/// A persisted menu item as served to the site.
#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub available: bool,
    pub available_date: String,
    pub tag: Option<MenuTag>,
}

/// Write/read seam over the relational store, so ingestion tests can
/// simulate per-row insert failures.
pub trait MenuStore: Send + Sync {
    /// Insert one item with `available = true`. Returns the new row id.
    fn insert_item(&self, item: &NewMenuItem) -> Result<i64, StoreError>;

    /// All items dated the given ISO date, in insertion order. The
    /// `available` flag is returned as-is so the site can render sold-out
    /// items.
    fn menu_for_date(&self, date: &str) -> Result<Vec<MenuItem>, StoreError>;

    /// Toggle a row's availability. Returns false when no such row exists.
    fn set_availability(&self, id: i64, available: bool) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS menu_item (
                id             INTEGER PRIMARY KEY,
                name           TEXT NOT NULL,
                price          INTEGER NOT NULL,
                available      INTEGER NOT NULL DEFAULT 1,
                available_date TEXT NOT NULL,
                tag            TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_menu_item_date ON menu_item(available_date);",
        )?;
        Ok(())
    }
}

impl MenuStore for SqliteStore {
    fn insert_item(&self, item: &NewMenuItem) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO menu_item (name, price, available, available_date, tag)
             VALUES (?1, ?2, 1, ?3, ?4)",
            params![
                item.name,
                item.price,
                item.available_date,
                item.tag.map(|t| t.label()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted menu item {} ('{}')", id, item.name);
        Ok(id)
    }

    fn menu_for_date(&self, date: &str) -> Result<Vec<MenuItem>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, price, available, available_date, tag
             FROM menu_item WHERE available_date = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![date], |row| {
                Ok(MenuItem {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    price: row.get(2)?,
                    available: row.get(3)?,
                    available_date: row.get(4)?,
                    tag: row
                        .get::<_, Option<String>>(5)?
                        .as_deref()
                        .and_then(MenuTag::from_label),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn set_availability(&self, id: i64, available: bool) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE menu_item SET available = ?1 WHERE id = ?2",
            params![available, id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, date: &str) -> NewMenuItem {
        NewMenuItem {
            name: name.to_string(),
            price: 650,
            available_date: date.to_string(),
            tag: Some(MenuTag::Curry),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert_item(&item("カレーライス", "2025-06-01")).unwrap();
        assert!(id > 0);

        let items = store.menu_for_date("2025-06-01").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "カレーライス");
        assert_eq!(items[0].price, 650);
        assert!(items[0].available);
        assert_eq!(items[0].tag, Some(MenuTag::Curry));

        assert!(store.menu_for_date("2025-06-02").unwrap().is_empty());
    }

    #[test]
    fn test_set_availability() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert_item(&item("Set A", "2025-06-01")).unwrap();

        assert!(store.set_availability(id, false).unwrap());
        let items = store.menu_for_date("2025-06-01").unwrap();
        assert!(!items[0].available);

        assert!(!store.set_availability(9999, false).unwrap());
    }

    #[test]
    fn test_null_tag_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_item(&NewMenuItem {
                tag: None,
                ..item("Daily special", "2025-06-03")
            })
            .unwrap();
        let items = store.menu_for_date("2025-06-03").unwrap();
        assert_eq!(items[0].tag, None);
    }
}
