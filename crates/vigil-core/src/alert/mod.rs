pub mod external;
pub mod fingerprint;
pub mod status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{AlertId, ServiceId, UserId};
use crate::integration::IntegrationKind;

pub use external::ExternalAlert;
pub use fingerprint::Fingerprint;
pub use status::Status;

/// Canonical persisted alert row: one manifestation of an external alert
/// condition against one internal service.
///
/// Sync-owned fields are refreshed on every reconciliation cycle.
/// `is_dismissed` and `owner_id` are user-owned and only change through
/// [`Alert::dismiss`] / [`Alert::assign`]; [`Alert::apply_sync_update`]
/// must never touch them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    id: AlertId,
    source: IntegrationKind,
    service_id: ServiceId,
    tag: String,
    status: Status,
    starts_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    alert_url: Option<String>,
    alert_name: Option<String>,
    summary: Option<String>,
    runbook_url: Option<String>,
    is_dismissed: bool,
    owner_id: Option<UserId>,
}

impl Alert {
    /// Build the canonical row for one `(external alert, service)` pair.
    pub fn from_external(
        external: &ExternalAlert,
        service_id: ServiceId,
        source: IntegrationKind,
    ) -> Result<Self, DomainError> {
        let tag = external
            .tag_label
            .clone()
            .ok_or(DomainError::MissingRoutingTag)?;
        Ok(Self {
            id: AlertId::new(&external.fingerprint, service_id),
            source,
            service_id,
            tag,
            status: Status::from_external(&external.state),
            starts_at: external.started_at,
            updated_at: external.updated_at,
            alert_url: external.generator_url.clone(),
            alert_name: external.name.clone(),
            summary: external.summary.clone(),
            runbook_url: external.runbook_url.clone(),
            is_dismissed: false,
            owner_id: None,
        })
    }

    /// Rebuild a row from persisted parts.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: AlertId,
        source: IntegrationKind,
        service_id: ServiceId,
        tag: String,
        status: Status,
        starts_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
        alert_url: Option<String>,
        alert_name: Option<String>,
        summary: Option<String>,
        runbook_url: Option<String>,
        is_dismissed: bool,
        owner_id: Option<UserId>,
    ) -> Self {
        Self {
            id,
            source,
            service_id,
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
        }
    }

    /// Overwrite sync-owned fields from a freshly-synced candidate with
    /// the same id, leaving user-owned fields intact.
    pub fn apply_sync_update(&mut self, incoming: &Alert) {
        debug_assert_eq!(self.id, incoming.id);
        self.tag = incoming.tag.clone();
        self.status = incoming.status;
        self.starts_at = incoming.starts_at;
        self.updated_at = incoming.updated_at;
        self.alert_url = incoming.alert_url.clone();
        self.alert_name = incoming.alert_name.clone();
        self.summary = incoming.summary.clone();
        self.runbook_url = incoming.runbook_url.clone();
    }

    pub fn dismiss(&mut self, dismissed: bool) {
        self.is_dismissed = dismissed;
    }

    pub fn assign(&mut self, owner: Option<UserId>) {
        self.owner_id = owner;
    }

    pub fn id(&self) -> &AlertId {
        &self.id
    }

    pub fn source(&self) -> IntegrationKind {
        self.source
    }

    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn alert_url(&self) -> Option<&str> {
        self.alert_url.as_deref()
    }

    pub fn alert_name(&self) -> Option<&str> {
        self.alert_name.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn runbook_url(&self) -> Option<&str> {
        self.runbook_url.as_deref()
    }

    pub fn is_dismissed(&self) -> bool {
        self.is_dismissed
    }

    pub fn owner_id(&self) -> Option<&UserId> {
        self.owner_id.as_ref()
    }
}
