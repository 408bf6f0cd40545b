//! Durable storage backends for activity records

use crate::error::{Result, TutorMatchError};
use crate::types::AuditRecord;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Trait for persisting activity records
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist a single activity record
    async fn record(&self, record: AuditRecord) -> Result<()>;
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    connection_id TEXT NOT NULL,
    username TEXT,
    details TEXT NOT NULL,
    source_addr TEXT,
    client_agent TEXT,
    recorded_at TEXT NOT NULL
)";

/// SQLite-backed activity store
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    /// Connect to the database and ensure the schema exists.
    ///
    /// Callers treat a failure here as fatal: a service that cannot reach
    /// its audit store at boot must not start.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| TutorMatchError::AuditStoreFailed {
                message: format!("Invalid audit database URL '{}': {}", database_url, e),
            })?
            .create_if_missing(true);

        // One connection is enough: the worker serializes writes anyway,
        // and it keeps in-memory databases on a single handle
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| TutorMatchError::AuditStoreFailed {
                message: format!("Failed to open audit database: {}", e),
            })?;

        sqlx::query(SCHEMA).execute(&pool).await.map_err(|e| {
            TutorMatchError::AuditStoreFailed {
                message: format!("Failed to create activity_log table: {}", e),
            }
        })?;

        info!("Audit store ready at {}", database_url);
        Ok(Self { pool })
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn record(&self, record: AuditRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO activity_log \
             (kind, connection_id, username, details, source_addr, client_agent, recorded_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(record.kind.as_str())
        .bind(record.connection_id.to_string())
        .bind(&record.username)
        .bind(record.details.to_string())
        .bind(&record.source_addr)
        .bind(&record.client_agent)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| TutorMatchError::AuditStoreFailed {
            message: format!("Failed to insert activity record: {}", e),
        })?;

        Ok(())
    }
}

/// In-memory activity store for tests
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    records: std::sync::Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records received so far (for assertions)
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Number of records of one kind (for assertions)
    pub fn count_of(&self, kind: crate::types::AuditKind) -> usize {
        self.records()
            .iter()
            .filter(|record| record.kind == kind)
            .count()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn record(&self, record: AuditRecord) -> Result<()> {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
        Ok(())
    }
}
