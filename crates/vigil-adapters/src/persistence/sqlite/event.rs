use async_trait::async_trait;

use vigil_core::events::SyncEvent;
use vigil_ports::error::PortError;
use vigil_ports::outbound::EventPublisher;

use super::SqliteDb;

#[async_trait]
impl EventPublisher for SqliteDb {
    async fn publish(&self, events: Vec<SyncEvent>) -> Result<(), PortError> {
        for event in &events {
            let data =
                serde_json::to_string(event).map_err(|e| PortError::Persistence(e.to_string()))?;

            sqlx::query(
                "INSERT INTO sync_events (event_type, source, data, occurred_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(event.event_type())
            .bind(event.source().as_str())
            .bind(&data)
            .bind(event.occurred_at().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}
