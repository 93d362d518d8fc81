//! Query history: one row per weather lookup, stored in SQLite.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::{fmt::Debug, fs, path::Path, sync::Mutex};

use crate::model::WeatherResponse;

/// Sink for recorded weather queries.
///
/// Methods are synchronous and may block on I/O. [`crate::WeatherService`]
/// calls `save_weather_query` through `tokio::task::spawn_blocking`, so
/// async callers should do the same.
pub trait HistoryStore: Send + Sync + Debug {
    /// Records one lookup. `city` is empty for coordinate lookups.
    fn save_weather_query(&self, city: &str, weather: &WeatherResponse) -> Result<()>;

    /// Most recent queries first.
    fn recent_queries(&self, limit: usize) -> Result<Vec<HistoryEntry>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub weather: WeatherResponse,
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_queries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        city TEXT NOT NULL,
        response TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_weather_queries_created ON weather_queries(created_at);
"#;

/// SQLite-backed [`HistoryStore`]. Writes are insert-only and serialized
/// through a single connection.
#[derive(Debug)]
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    /// Opens (or creates) the database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open history database: {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to apply history schema")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("history connection lock poisoned"))
    }
}

impl HistoryStore for SqliteHistory {
    fn save_weather_query(&self, city: &str, weather: &WeatherResponse) -> Result<()> {
        let payload =
            serde_json::to_string(weather).context("Failed to serialize weather response")?;
        let created_at = Utc::now().to_rfc3339();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO weather_queries (city, response, created_at) VALUES (?1, ?2, ?3)",
            params![city, payload, created_at],
        )
        .context("Failed to insert weather query")?;

        tracing::debug!(city, id = conn.last_insert_rowid(), "Recorded weather query");
        Ok(())
    }

    fn recent_queries(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, city, response, created_at
             FROM weather_queries
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, city, response, created_at)| -> Result<HistoryEntry> {
                let weather: WeatherResponse = serde_json::from_str(&response)
                    .with_context(|| format!("Corrupt response payload in history row {id}"))?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .with_context(|| format!("Corrupt timestamp in history row {id}"))?
                    .with_timezone(&Utc);
                Ok(HistoryEntry {
                    id,
                    city,
                    created_at,
                    weather,
                })
            })
            .collect()
    }
}
