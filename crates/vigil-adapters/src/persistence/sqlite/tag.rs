use async_trait::async_trait;

use vigil_core::ids::ServiceId;
use vigil_ports::error::PortError;
use vigil_ports::outbound::TagIndex;

use super::SqliteDb;

impl SqliteDb {
    /// Bind a service to a tag, creating the tag if needed. Tag and
    /// service management proper lives outside the sync engine; this is
    /// the minimal write surface wiring and tests need.
    pub async fn bind_service_tag(
        &self,
        service_id: ServiceId,
        tag: &str,
    ) -> Result<(), PortError> {
        sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?)")
            .bind(tag)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query("INSERT OR IGNORE INTO service_tags (service_id, tag_name) VALUES (?, ?)")
            .bind(service_id.value())
            .bind(tag)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    pub async fn unbind_service_tag(
        &self,
        service_id: ServiceId,
        tag: &str,
    ) -> Result<(), PortError> {
        sqlx::query("DELETE FROM service_tags WHERE service_id = ? AND tag_name = ?")
            .bind(service_id.value())
            .bind(tag)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TagIndex for SqliteDb {
    async fn all_tag_names(&self) -> Result<Vec<String>, PortError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn service_ids_for_tag(&self, name: &str) -> Result<Vec<ServiceId>, PortError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT service_id FROM service_tags WHERE tag_name = ? ORDER BY service_id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| ServiceId::new(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn db() -> SqliteDb {
        SqliteDb::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn bound_services_are_resolved_in_order() {
        let db = db().await;
        db.bind_service_tag(ServiceId::new(9), "prod").await.unwrap();
        db.bind_service_tag(ServiceId::new(5), "prod").await.unwrap();

        let ids = db.service_ids_for_tag("prod").await.unwrap();
        assert_eq!(ids, vec![ServiceId::new(5), ServiceId::new(9)]);
    }

    #[tokio::test]
    async fn unknown_tag_resolves_to_no_services() {
        let db = db().await;
        assert!(db.service_ids_for_tag("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_tag_names_lists_every_tag_once() {
        let db = db().await;
        db.bind_service_tag(ServiceId::new(5), "prod").await.unwrap();
        db.bind_service_tag(ServiceId::new(9), "prod").await.unwrap();
        db.bind_service_tag(ServiceId::new(5), "edge").await.unwrap();

        assert_eq!(db.all_tag_names().await.unwrap(), vec!["edge", "prod"]);
    }

    #[tokio::test]
    async fn unbind_removes_membership_keeps_tag() {
        let db = db().await;
        db.bind_service_tag(ServiceId::new(5), "prod").await.unwrap();
        db.unbind_service_tag(ServiceId::new(5), "prod").await.unwrap();

        assert!(db.service_ids_for_tag("prod").await.unwrap().is_empty());
        assert_eq!(db.all_tag_names().await.unwrap(), vec!["prod"]);
    }
}
