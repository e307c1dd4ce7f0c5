//! Embedded product database
//!
//! A single SQLite connection (in-memory by default) guarded by a mutex. All
//! calls are blocking; async callers are expected to offload them.

use crate::model::Product;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid timestamp in row: {0}")]
    Timestamp(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub struct ProductStore {
    conn: Mutex<Connection>,
}

impl ProductStore {
    /// Opens (or creates) the database at `path`; `:memory:` keeps it in RAM.
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::open(IN_MEMORY)
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                price REAL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts a new product or updates an existing one, returning the stored row.
    pub fn save(&self, product: &Product) -> StoreResult<Product> {
        let conn = self.lock();

        let existing = match product.id {
            Some(id) => find_row(&conn, id)?,
            None => None,
        };

        let id = match existing {
            Some(current) => {
                let created_at = product.created_at.or(current.created_at);
                conn.execute(
                    "UPDATE products SET name = ?1, description = ?2, price = ?3, created_at = ?4 WHERE id = ?5",
                    params![
                        product.name,
                        product.description,
                        product.price,
                        format_timestamp(created_at)?,
                        current.id,
                    ],
                )?;
                current.id.unwrap_or_default()
            }
            None => {
                let created_at = product.created_at.unwrap_or_else(OffsetDateTime::now_utc);
                match product.id {
                    Some(id) => {
                        conn.execute(
                            "INSERT INTO products (id, name, description, price, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                            params![
                                id,
                                product.name,
                                product.description,
                                product.price,
                                format_timestamp(Some(created_at))?,
                            ],
                        )?;
                        id
                    }
                    None => {
                        conn.execute(
                            "INSERT INTO products (name, description, price, created_at) VALUES (?1, ?2, ?3, ?4)",
                            params![
                                product.name,
                                product.description,
                                product.price,
                                format_timestamp(Some(created_at))?,
                            ],
                        )?;
                        conn.last_insert_rowid()
                    }
                }
            }
        };

        tracing::debug!("saved product {}", id);
        find_row(&conn, id)?.ok_or(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        find_row(&self.lock(), id)
    }

    pub fn find_all(&self) -> StoreResult<Vec<Product>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, price, created_at FROM products ORDER BY id",
        )?;
        let rows = stmt.query_map([], RawProduct::from_row)?;
        collect_products(rows)
    }

    pub fn find_all_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, description, price, created_at FROM products WHERE id IN ({}) ORDER BY id",
            placeholders
        );

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), RawProduct::from_row)?;
        collect_products(rows)
    }

    pub fn delete_by_id(&self, id: i64) -> StoreResult<()> {
        self.lock()
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn delete_all(&self) -> StoreResult<()> {
        self.lock().execute("DELETE FROM products", [])?;
        Ok(())
    }

    pub fn count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

// column values as read, before the timestamp is parsed
struct RawProduct {
    id: i64,
    name: String,
    description: Option<String>,
    price: Option<f64>,
    created_at: String,
}

impl RawProduct {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_product(self) -> StoreResult<Product> {
        let created_at = OffsetDateTime::parse(&self.created_at, &Rfc3339)
            .map_err(|e| StoreError::Timestamp(format!("{} ({})", self.created_at, e)))?;
        Ok(Product {
            id: Some(self.id),
            name: self.name,
            description: self.description,
            price: self.price,
            created_at: Some(created_at),
        })
    }
}

fn find_row(conn: &Connection, id: i64) -> StoreResult<Option<Product>> {
    let raw = conn
        .query_row(
            "SELECT id, name, description, price, created_at FROM products WHERE id = ?1",
            params![id],
            RawProduct::from_row,
        )
        .optional()?;
    raw.map(RawProduct::into_product).transpose()
}

fn collect_products(
    rows: impl Iterator<Item = rusqlite::Result<RawProduct>>,
) -> StoreResult<Vec<Product>> {
    let mut products = Vec::new();
    for row in rows {
        products.push(row?.into_product()?);
    }
    Ok(products)
}

fn format_timestamp(ts: Option<OffsetDateTime>) -> StoreResult<String> {
    ts.unwrap_or_else(OffsetDateTime::now_utc)
        .format(&Rfc3339)
        .map_err(|e| StoreError::Timestamp(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn product(name: &str, price: f64) -> Product {
        Product::new(name, format!("{} description", name), price)
    }

    #[test]
    fn test_save_assigns_id_and_timestamp() {
        let store = ProductStore::in_memory().unwrap();

        let saved = store.save(&product("Kettle", 25.0)).unwrap();
        assert_eq!(saved.id, Some(1));
        assert!(saved.created_at.is_some());

        let second = store.save(&product("Toaster", 40.0)).unwrap();
        assert_eq!(second.id, Some(2));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_save_updates_existing_row() {
        let store = ProductStore::in_memory().unwrap();
        let saved = store.save(&product("Kettle", 25.0)).unwrap();
        let created_at = saved.created_at;

        let mut changed = saved.clone();
        changed.price = Some(19.5);
        changed.created_at = None;
        let updated = store.save(&changed).unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.price, Some(19.5));
        assert_eq!(updated.created_at, created_at);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_save_with_unknown_id_inserts() {
        let store = ProductStore::in_memory().unwrap();
        let mut explicit = product("Mixer", 60.0);
        explicit.id = Some(42);

        let saved = store.save(&explicit).unwrap();
        assert_eq!(saved.id, Some(42));
        assert!(store.find_by_id(42).unwrap().is_some());
    }

    #[test]
    fn test_find_and_delete() {
        let store = ProductStore::in_memory().unwrap();
        for i in 1..=5 {
            store.save(&product(&format!("Item {}", i), i as f64)).unwrap();
        }

        assert_eq!(store.find_by_id(3).unwrap().unwrap().name, "Item 3");
        assert!(store.find_by_id(99).unwrap().is_none());

        let all = store.find_all().unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].id, Some(1));

        let some = store.find_all_by_ids(&[4, 2, 77]).unwrap();
        let ids: Vec<_> = some.iter().filter_map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 4]);
        assert!(store.find_all_by_ids(&[]).unwrap().is_empty());

        store.delete_by_id(2).unwrap();
        assert!(store.find_by_id(2).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 4);

        store.delete_all().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        let path = path.to_str().unwrap();

        {
            let store = ProductStore::open(path).unwrap();
            store.save(&product("Lamp", 30.0)).unwrap();
        }

        let reopened = ProductStore::open(path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(reopened.find_by_id(1).unwrap().unwrap().name, "Lamp");
    }

    #[test]
    fn test_concurrent_inserts() {
        let store = Arc::new(ProductStore::in_memory().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.save(&product(&format!("T{}-{}", t, i), 1.0)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count().unwrap(), 200);
    }
}
