use std::collections::HashSet;

use async_trait::async_trait;

use vigil_core::alert::{Alert, ExternalAlert};
use vigil_core::events::SyncEvent;
use vigil_core::ids::{ServiceId, UserId};
use vigil_core::integration::{Integration, IntegrationKind};

use crate::error::{FetchError, PortError};

/// Canonical alert persistence.
///
/// `upsert` is a single atomic write: insert when the id is new, otherwise
/// update sync-owned fields only, leaving `is_dismissed`/`owner_id` as the
/// user set them. No read-modify-write.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn upsert(&self, alert: &Alert) -> Result<(), PortError>;

    /// Delete every alert owned by `source` whose id is not in `kept_ids`.
    /// Rows from other sources are never touched. Returns the delete count.
    async fn delete_alerts_not_in(
        &self,
        source: IntegrationKind,
        kept_ids: &HashSet<String>,
    ) -> Result<u64, PortError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Alert>, PortError>;
    async fn list_by_service(&self, service_id: ServiceId) -> Result<Vec<Alert>, PortError>;

    async fn set_dismissed(&self, id: &str, dismissed: bool) -> Result<(), PortError>;
    async fn set_owner(&self, id: &str, owner: Option<&UserId>) -> Result<(), PortError>;
}

/// Resolves tag membership for fanout.
#[async_trait]
pub trait TagIndex: Send + Sync {
    async fn all_tag_names(&self) -> Result<Vec<String>, PortError>;
    async fn service_ids_for_tag(&self, name: &str) -> Result<Vec<ServiceId>, PortError>;
}

/// Looks up enabled integrations. `None` means disabled or unconfigured;
/// the caller skips silently rather than erroring.
#[async_trait]
pub trait IntegrationRegistry: Send + Sync {
    async fn get_by_kind(&self, kind: IntegrationKind)
        -> Result<Option<Integration>, PortError>;
}

/// One implementation per external backend.
///
/// A malformed individual alert is skipped and counted by the adapter,
/// never fatal to the fetch; the error path is reserved for auth and
/// connectivity failures against the backend itself. Pagination and
/// windowing are the adapter's business.
#[async_trait]
pub trait AlertSource: Send + Sync {
    fn kind(&self) -> IntegrationKind;

    async fn fetch(
        &self,
        integration: &Integration,
        known_tags: &[String],
    ) -> Result<Vec<ExternalAlert>, FetchError>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, events: Vec<SyncEvent>) -> Result<(), PortError>;
}
