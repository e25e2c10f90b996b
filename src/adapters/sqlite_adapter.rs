//! SQLite price modifier store.

use crate::domain::error::AnalyticsError;
use crate::domain::modifier_table::ModifierRow;
use crate::ports::config_port::ConfigPort;
use crate::ports::modifier_port::ModifierSource;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;

/// Rows inserted by `initialize_schema(true)`.
pub const MOCKUP_MODIFIERS: [(&str, f64); 2] = [("INSTRUMENT1", 1.5), ("INSTRUMENT2", 1.2)];

pub struct SqliteModifierStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteModifierStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AnalyticsError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| AnalyticsError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = u32::try_from(config.get_int("sqlite", "pool_size", 4))
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AnalyticsError::ConfigInvalid {
                section: "sqlite".into(),
                key: "pool_size".into(),
                reason: "pool_size must be at least 1".into(),
            })?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| AnalyticsError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, AnalyticsError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| AnalyticsError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, AnalyticsError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| AnalyticsError::Database {
                reason: e.to_string(),
            })
    }

    /// Create the modifier table if needed; with `seed_mockup`, also insert
    /// [`MOCKUP_MODIFIERS`].
    pub fn initialize_schema(&self, seed_mockup: bool) -> Result<(), AnalyticsError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS INSTRUMENT_PRICE_MODIFIER (
                ID INTEGER PRIMARY KEY,
                NAME TEXT,
                MULTIPLIER REAL
            );",
        )
        .map_err(|e: rusqlite::Error| AnalyticsError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        drop(conn);

        if seed_mockup {
            for (name, multiplier) in MOCKUP_MODIFIERS {
                self.insert_modifier(name, multiplier)?;
            }
        }

        info!(seed_mockup, "modifier schema initialised");
        Ok(())
    }

    /// Returns the new row id.
    pub fn insert_modifier(&self, name: &str, multiplier: f64) -> Result<i64, AnalyticsError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO INSTRUMENT_PRICE_MODIFIER (NAME, MULTIPLIER) VALUES (?1, ?2)",
            params![name, multiplier],
        )
        .map_err(|e: rusqlite::Error| AnalyticsError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(conn.last_insert_rowid())
    }
}

impl ModifierSource for SqliteModifierStore {
    fn fetch_modifiers(&self) -> Result<Vec<ModifierRow>, AnalyticsError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT ID, NAME, MULTIPLIER FROM INSTRUMENT_PRICE_MODIFIER ORDER BY ID")
            .map_err(|e: rusqlite::Error| AnalyticsError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ModifierRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    multiplier: row.get(2)?,
                })
            })
            .map_err(|e: rusqlite::Error| AnalyticsError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut modifiers = Vec::new();
        for row in rows {
            modifiers.push(
                row.map_err(|e: rusqlite::Error| AnalyticsError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(modifiers)
    }
}
