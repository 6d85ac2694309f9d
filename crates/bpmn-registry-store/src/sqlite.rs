//! SQLite implementation of ProcessStore
//!
//! Uses a sqlx connection pool. The schema is created on connect and is
//! idempotent, so pointing several processes at the same file is fine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::{Process, ProcessChanges, ProcessStore, StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS processes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NULL,
    bpmn_xml TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, name, description, bpmn_xml, created_at, updated_at FROM processes";

/// Configuration for the SQLite store
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Connection URL, e.g. `sqlite://registry.db` or `sqlite::memory:`
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }
}

/// SQLite implementation of ProcessStore
#[derive(Debug, Clone)]
pub struct SqliteProcessStore {
    pool: SqlitePool,
}

impl SqliteProcessStore {
    /// Connect to the database and create the schema if needed
    pub async fn connect(config: &SqliteConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Configuration(format!("Invalid SQLite URL {}: {}", config.url, e)))?
            .create_if_missing(true);

        // Every connection to an in-memory database gets its own empty
        // database, so the pool must hold exactly one that never expires.
        let in_memory = config.url.contains(":memory:") || config.url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to SQLite: {}", e)))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!(url = %config.url, "Connected to SQLite process store");
        Ok(store)
    }

    /// Wrap an existing pool. The schema is created before returning.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create the `processes` table if it does not exist
    pub async fn run_migrations(&self) -> StoreResult<()> {
        debug!("Running process store migrations");
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_process(row: &SqliteRow) -> StoreResult<Process> {
        Ok(Process {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            bpmn_xml: row.try_get("bpmn_xml")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

#[async_trait]
impl ProcessStore for SqliteProcessStore {
    async fn insert(&self, process: &Process) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO processes (id, name, description, bpmn_xml, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&process.id)
        .bind(&process.name)
        .bind(&process.description)
        .bind(&process.bpmn_xml)
        .bind(process.created_at)
        .bind(process.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Process>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_process).transpose()
    }

    async fn find_all(&self) -> StoreResult<Vec<Process>> {
        let rows = sqlx::query(SELECT_COLUMNS).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_process).collect()
    }

    async fn update_fields(&self, id: &str, changes: &ProcessChanges) -> StoreResult<bool> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE processes SET updated_at = ");
        builder.push_bind(changes.updated_at);

        if let Some(name) = &changes.name {
            builder.push(", name = ").push_bind(name.clone());
        }
        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        if let Some(bpmn_xml) = &changes.bpmn_xml {
            builder.push(", bpmn_xml = ").push_bind(bpmn_xml.clone());
        }

        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM processes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        if self.pool.is_closed() {
            return Ok(false);
        }
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }

    async fn close(&self) {
        debug!("Closing SQLite process store");
        self.pool.close().await;
    }
}
