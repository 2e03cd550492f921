//! SQLite screen store.
//!
//! Screens are stored as JSON documents keyed by id; `name` and `updated_at`
//! are duplicated into columns for ordering.

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreenDefinition;
use crate::ports::config_port::ConfigPort;
use crate::ports::screen_store::ScreenStore;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

pub struct SqliteScreenStore {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> ScreenerError {
    ScreenerError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> ScreenerError {
    ScreenerError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn pool_size(raw: i64) -> Result<u32, ScreenerError> {
    match u32::try_from(raw) {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ScreenerError::ConfigInvalid {
            section: "sqlite".into(),
            key: "pool_size".into(),
            reason: format!("expected a positive pool size, got {raw}"),
        }),
    }
}

impl SqliteScreenStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| ScreenerError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = pool_size(config.get_int("sqlite", "pool_size", 4))?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, ScreenerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn initialize_schema(&self) -> Result<(), ScreenerError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS screens (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_screens_name ON screens(name);",
        )
        .map_err(query_error)?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ScreenerError> {
        self.pool.get().map_err(pool_error)
    }
}

impl ScreenStore for SqliteScreenStore {
    fn save(&self, screen: &ScreenDefinition) -> Result<(), ScreenerError> {
        let body = serde_json::to_string(screen)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO screens (id, name, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                screen.id(),
                screen.name(),
                body,
                screen.updated_at().to_rfc3339()
            ],
        )
        .map_err(query_error)?;
        tracing::debug!(id = screen.id(), "saved screen");
        Ok(())
    }

    fn load(&self, id: &str) -> Result<ScreenDefinition, ScreenerError> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .query_row("SELECT body FROM screens WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(query_error)?;

        match body {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Err(ScreenerError::NotFound { id: id.to_string() }),
        }
    }

    fn list(&self) -> Result<Vec<ScreenDefinition>, ScreenerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT body FROM screens ORDER BY name ASC, id ASC")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_error)?;

        let mut screens = Vec::new();
        for row in rows {
            let body = row.map_err(query_error)?;
            screens.push(serde_json::from_str(&body)?);
        }
        Ok(screens)
    }

    fn delete(&self, id: &str) -> Result<(), ScreenerError> {
        let conn = self.conn()?;
        let affected = conn
            .execute("DELETE FROM screens WHERE id = ?1", params![id])
            .map_err(query_error)?;
        if affected == 0 {
            return Err(ScreenerError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}
