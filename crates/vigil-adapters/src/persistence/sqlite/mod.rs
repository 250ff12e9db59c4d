mod alert;
mod event;
mod integration;
mod tag;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use vigil_ports::error::PortError;

#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    pub async fn new(url: &str) -> Result<Self, PortError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| PortError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), PortError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                service_id INTEGER NOT NULL,
                tag TEXT NOT NULL,
                status TEXT NOT NULL,
                starts_at TEXT,
                updated_at TEXT,
                alert_url TEXT,
                alert_name TEXT,
                summary TEXT,
                runbook_url TEXT,
                is_dismissed INTEGER NOT NULL DEFAULT 0,
                owner_id TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_alerts_source ON alerts(source)")
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_alerts_service ON alerts(service_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tags (
                name TEXT PRIMARY KEY
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS service_tags (
                service_id INTEGER NOT NULL,
                tag_name TEXT NOT NULL,
                PRIMARY KEY (service_id, tag_name)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_service_tags_tag ON service_tags(tag_name)")
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS integrations (
                kind TEXT PRIMARY KEY,
                id TEXT NOT NULL,
                external_url TEXT NOT NULL,
                credentials TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sync_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                source TEXT NOT NULL,
                data TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
