use std::collections::BTreeMap;

use async_trait::async_trait;

use vigil_core::ids::IntegrationId;
use vigil_core::integration::{Integration, IntegrationKind};
use vigil_ports::error::PortError;
use vigil_ports::outbound::IntegrationRegistry;

use super::SqliteDb;

impl SqliteDb {
    /// Insert or replace the configuration row for one backend kind.
    /// Called at boot when seeding from the config file.
    pub async fn upsert_integration(
        &self,
        integration: &Integration,
        enabled: bool,
    ) -> Result<(), PortError> {
        let credentials = serde_json::to_string(&integration.credentials)
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "INSERT INTO integrations (kind, id, external_url, credentials, enabled)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(kind) DO UPDATE SET
                external_url = excluded.external_url,
                credentials = excluded.credentials,
                enabled = excluded.enabled",
        )
        .bind(integration.kind.as_str())
        .bind(integration.id.to_string())
        .bind(&integration.external_url)
        .bind(&credentials)
        .bind(enabled as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    pub async fn set_integration_enabled(
        &self,
        kind: IntegrationKind,
        enabled: bool,
    ) -> Result<(), PortError> {
        sqlx::query("UPDATE integrations SET enabled = ? WHERE kind = ?")
            .bind(enabled as i64)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl IntegrationRegistry for SqliteDb {
    async fn get_by_kind(
        &self,
        kind: IntegrationKind,
    ) -> Result<Option<Integration>, PortError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT id, external_url, credentials FROM integrations
             WHERE kind = ? AND enabled = 1",
        )
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        let Some((id, external_url, credentials)) = row else {
            return Ok(None);
        };

        let id = IntegrationId::parse(&id).map_err(|e| PortError::Persistence(e.to_string()))?;
        let credentials: BTreeMap<String, String> = serde_json::from_str(&credentials)
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(Some(Integration {
            id,
            kind,
            external_url,
            credentials,
        }))
    }
}
