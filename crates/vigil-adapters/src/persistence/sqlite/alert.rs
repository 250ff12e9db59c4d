use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vigil_core::alert::{Alert, Status};
use vigil_core::ids::{AlertId, ServiceId, UserId};
use vigil_core::integration::IntegrationKind;
use vigil_ports::error::PortError;
use vigil_ports::outbound::AlertStore;

use super::SqliteDb;

type AlertRow = (
    String,         // id
    String,         // source
    String,         // tag
    String,         // status
    Option<String>, // starts_at
    Option<String>, // updated_at
    Option<String>, // alert_url
    Option<String>, // alert_name
    Option<String>, // summary
    Option<String>, // runbook_url
    i64,            // is_dismissed
    Option<String>, // owner_id
);

const SELECT_COLUMNS: &str = "id, source, tag, status, starts_at, updated_at, \
     alert_url, alert_name, summary, runbook_url, is_dismissed, owner_id";

fn parse_ts(value: Option<String>) -> Result<Option<DateTime<Utc>>, PortError> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| PortError::Persistence(format!("bad timestamp {s}: {e}")))
        })
        .transpose()
}

fn row_to_alert(row: AlertRow) -> Result<Alert, PortError> {
    let (
        id,
        source,
        tag,
        status,
        starts_at,
        updated_at,
        alert_url,
        alert_name,
        summary,
        runbook_url,
        is_dismissed,
        owner_id,
    ) = row;

    let id = AlertId::parse(&id).map_err(|e| PortError::Persistence(e.to_string()))?;
    let source =
        IntegrationKind::parse(&source).map_err(|e| PortError::Persistence(e.to_string()))?;
    let status = Status::parse(&status)
        .ok_or_else(|| PortError::Persistence(format!("bad status: {status}")))?;
    let owner_id = owner_id
        .map(|s| UserId::parse(&s).map_err(|e| PortError::Persistence(e.to_string())))
        .transpose()?;

    // The service half of the composite key is authoritative; the
    // service_id column exists for indexed service queries only.
    let service_id = id.service_id();

    Ok(Alert::restore(
        id,
        source,
        service_id,
        tag,
        status,
        parse_ts(starts_at)?,
        parse_ts(updated_at)?,
        alert_url,
        alert_name,
        summary,
        runbook_url,
        is_dismissed != 0,
        owner_id,
    ))
}

#[async_trait]
impl AlertStore for SqliteDb {
    /// Single atomic write. The conflict clause refreshes sync-owned
    /// columns only; `is_dismissed` and `owner_id` are deliberately
    /// absent from the UPDATE SET list so re-sync never clobbers them.
    async fn upsert(&self, alert: &Alert) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO alerts (id, source, service_id, tag, status, starts_at, updated_at,
                                 alert_url, alert_name, summary, runbook_url, is_dismissed, owner_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                tag = excluded.tag,
                status = excluded.status,
                starts_at = excluded.starts_at,
                updated_at = excluded.updated_at,
                alert_url = excluded.alert_url,
                alert_name = excluded.alert_name,
                summary = excluded.summary,
                runbook_url = excluded.runbook_url",
        )
        .bind(alert.id().as_str())
        .bind(alert.source().as_str())
        .bind(alert.service_id().value())
        .bind(alert.tag())
        .bind(alert.status().as_str())
        .bind(alert.starts_at().map(|t| t.to_rfc3339()))
        .bind(alert.updated_at().map(|t| t.to_rfc3339()))
        .bind(alert.alert_url())
        .bind(alert.alert_name())
        .bind(alert.summary())
        .bind(alert.runbook_url())
        .bind(alert.is_dismissed() as i64)
        .bind(alert.owner_id().map(|o| o.to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn delete_alerts_not_in(
        &self,
        source: IntegrationKind,
        kept_ids: &HashSet<String>,
    ) -> Result<u64, PortError> {
        let mut sql = String::from("DELETE FROM alerts WHERE source = ?");
        if !kept_ids.is_empty() {
            let placeholders = vec!["?"; kept_ids.len()].join(", ");
            sql.push_str(&format!(" AND id NOT IN ({placeholders})"));
        }

        let mut query = sqlx::query(&sql).bind(source.as_str());
        for id in kept_ids {
            query = query.bind(id);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Alert>, PortError> {
        let row: Option<AlertRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM alerts WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;

        row.map(row_to_alert).transpose()
    }

    async fn list_by_service(&self, service_id: ServiceId) -> Result<Vec<Alert>, PortError> {
        let rows: Vec<AlertRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM alerts WHERE service_id = ? ORDER BY starts_at DESC"
        ))
        .bind(service_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        rows.into_iter().map(row_to_alert).collect()
    }

    async fn set_dismissed(&self, id: &str, dismissed: bool) -> Result<(), PortError> {
        let result = sqlx::query("UPDATE alerts SET is_dismissed = ? WHERE id = ?")
            .bind(dismissed as i64)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound);
        }
        Ok(())
    }

    async fn set_owner(&self, id: &str, owner: Option<&UserId>) -> Result<(), PortError> {
        let result = sqlx::query("UPDATE alerts SET owner_id = ? WHERE id = ?")
            .bind(owner.map(|o| o.to_string()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::alert::{ExternalAlert, Fingerprint};

    async fn db() -> SqliteDb {
        SqliteDb::new("sqlite::memory:").await.unwrap()
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn make_alert(fingerprint: &str, service: i64, source: IntegrationKind) -> Alert {
        let mut external =
            ExternalAlert::new(Fingerprint::new(fingerprint).unwrap(), "firing").with_tag("prod");
        external.started_at = Some(ts("2025-03-01T08:00:00Z"));
        external.name = Some("HighCPU".into());
        external.summary = Some("CPU above 90%".into());
        Alert::from_external(&external, ServiceId::new(service), source).unwrap()
    }

    #[tokio::test]
    async fn upsert_and_find_round_trip() {
        let db = db().await;
        let alert = make_alert("abc", 5, IntegrationKind::Grafana);

        db.upsert(&alert).await.unwrap();

        let found = db.find_by_id("abc:5").await.unwrap().unwrap();
        assert_eq!(found, alert);
        assert_eq!(found.service_id(), ServiceId::new(5));
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let db = db().await;
        assert!(db.find_by_id("nope:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_conflict_preserves_user_owned_columns() {
        let db = db().await;
        let alert = make_alert("abc", 5, IntegrationKind::Grafana);
        db.upsert(&alert).await.unwrap();

        let owner = UserId::new();
        db.set_dismissed("abc:5", true).await.unwrap();
        db.set_owner("abc:5", Some(&owner)).await.unwrap();

        // Re-sync the same id with refreshed sync-owned fields.
        let mut external =
            ExternalAlert::new(Fingerprint::new("abc").unwrap(), "resolved").with_tag("prod");
        external.summary = Some("recovered".into());
        let refreshed =
            Alert::from_external(&external, ServiceId::new(5), IntegrationKind::Grafana).unwrap();
        db.upsert(&refreshed).await.unwrap();

        let found = db.find_by_id("abc:5").await.unwrap().unwrap();
        assert_eq!(found.status(), Status::Resolved);
        assert_eq!(found.summary(), Some("recovered"));
        assert!(found.is_dismissed());
        assert_eq!(found.owner_id(), Some(&owner));
    }

    #[tokio::test]
    async fn delete_not_in_removes_only_unkept_rows_of_the_source() {
        let db = db().await;
        db.upsert(&make_alert("abc", 5, IntegrationKind::Grafana))
            .await
            .unwrap();
        db.upsert(&make_alert("abc", 9, IntegrationKind::Grafana))
            .await
            .unwrap();
        db.upsert(&make_alert("xyz", 5, IntegrationKind::Grafana))
            .await
            .unwrap();
        db.upsert(&make_alert("ddg", 5, IntegrationKind::Datadog))
            .await
            .unwrap();

        let kept: HashSet<String> = ["xyz:5".to_string()].into_iter().collect();
        let deleted = db
            .delete_alerts_not_in(IntegrationKind::Grafana, &kept)
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert!(db.find_by_id("abc:5").await.unwrap().is_none());
        assert!(db.find_by_id("abc:9").await.unwrap().is_none());
        assert!(db.find_by_id("xyz:5").await.unwrap().is_some());
        // Other integrations' namespaces are never touched.
        assert!(db.find_by_id("ddg:5").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_not_in_with_empty_kept_clears_the_source() {
        let db = db().await;
        db.upsert(&make_alert("abc", 5, IntegrationKind::Grafana))
            .await
            .unwrap();
        db.upsert(&make_alert("ddg", 5, IntegrationKind::Datadog))
            .await
            .unwrap();

        let deleted = db
            .delete_alerts_not_in(IntegrationKind::Grafana, &HashSet::new())
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(db.find_by_id("ddg:5").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_by_service_filters_rows() {
        let db = db().await;
        db.upsert(&make_alert("abc", 5, IntegrationKind::Grafana))
            .await
            .unwrap();
        db.upsert(&make_alert("abc", 9, IntegrationKind::Grafana))
            .await
            .unwrap();

        let alerts = db.list_by_service(ServiceId::new(5)).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id().as_str(), "abc:5");
    }

    #[tokio::test]
    async fn set_dismissed_on_missing_row_is_not_found() {
        let db = db().await;
        let result = db.set_dismissed("nope:1", true).await;
        assert!(matches!(result, Err(PortError::NotFound)));
    }
}
