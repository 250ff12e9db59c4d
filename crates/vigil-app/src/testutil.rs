//! Hand-rolled in-memory port implementations shared by the engine tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vigil_core::alert::{Alert, ExternalAlert, Fingerprint};
use vigil_core::events::SyncEvent;
use vigil_core::ids::{ServiceId, UserId};
use vigil_core::integration::{Integration, IntegrationKind};
use vigil_ports::error::{FetchError, PortError};
use vigil_ports::outbound::{
    AlertSource, AlertStore, EventPublisher, IntegrationRegistry, TagIndex,
};

pub fn make_external(fingerprint: &str, tag: &str) -> ExternalAlert {
    ExternalAlert::new(Fingerprint::new(fingerprint).unwrap(), "firing").with_tag(tag)
}

#[derive(Default, Clone)]
pub struct MockTagIndex {
    bindings: HashMap<String, Vec<i64>>,
}

impl MockTagIndex {
    pub fn with_binding(tag: &str, services: &[i64]) -> Self {
        let mut index = Self::default();
        index.bindings.insert(tag.into(), services.to_vec());
        index
    }

    pub fn bind(mut self, tag: &str, services: &[i64]) -> Self {
        self.bindings.insert(tag.into(), services.to_vec());
        self
    }
}

#[async_trait]
impl TagIndex for MockTagIndex {
    async fn all_tag_names(&self) -> Result<Vec<String>, PortError> {
        let mut names: Vec<String> = self.bindings.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn service_ids_for_tag(&self, name: &str) -> Result<Vec<ServiceId>, PortError> {
        Ok(self
            .bindings
            .get(name)
            .map(|ids| ids.iter().copied().map(ServiceId::new).collect())
            .unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub struct MockAlertStore {
    rows: Arc<Mutex<HashMap<String, Alert>>>,
    fail_ids: Arc<Mutex<HashSet<String>>>,
}

impl MockAlertStore {
    pub fn fail_on(&self, id: &str) {
        self.fail_ids.lock().unwrap().insert(id.into());
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn ids(&self) -> HashSet<String> {
        self.rows.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl AlertStore for MockAlertStore {
    async fn upsert(&self, alert: &Alert) -> Result<(), PortError> {
        let id = alert.id().as_str().to_string();
        if self.fail_ids.lock().unwrap().contains(&id) {
            return Err(PortError::Persistence("injected upsert failure".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(existing) => existing.apply_sync_update(alert),
            None => {
                rows.insert(id, alert.clone());
            }
        }
        Ok(())
    }

    async fn delete_alerts_not_in(
        &self,
        source: IntegrationKind,
        kept_ids: &HashSet<String>,
    ) -> Result<u64, PortError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|id, alert| alert.source() != source || kept_ids.contains(id));
        Ok((before - rows.len()) as u64)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Alert>, PortError> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn list_by_service(&self, service_id: ServiceId) -> Result<Vec<Alert>, PortError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.service_id() == service_id)
            .cloned()
            .collect())
    }

    async fn set_dismissed(&self, id: &str, dismissed: bool) -> Result<(), PortError> {
        let mut rows = self.rows.lock().unwrap();
        let alert = rows.get_mut(id).ok_or(PortError::NotFound)?;
        alert.dismiss(dismissed);
        Ok(())
    }

    async fn set_owner(&self, id: &str, owner: Option<&UserId>) -> Result<(), PortError> {
        let mut rows = self.rows.lock().unwrap();
        let alert = rows.get_mut(id).ok_or(PortError::NotFound)?;
        alert.assign(owner.cloned());
        Ok(())
    }
}

#[derive(Clone)]
pub struct MockRegistry {
    integration: Option<Integration>,
}

impl MockRegistry {
    pub fn enabled(kind: IntegrationKind) -> Self {
        Self {
            integration: Some(Integration::new(kind, "https://backend.example.com")),
        }
    }

    pub fn disabled() -> Self {
        Self { integration: None }
    }
}

#[async_trait]
impl IntegrationRegistry for MockRegistry {
    async fn get_by_kind(
        &self,
        kind: IntegrationKind,
    ) -> Result<Option<Integration>, PortError> {
        Ok(self
            .integration
            .clone()
            .filter(|integration| integration.kind == kind))
    }
}

#[derive(Default, Clone)]
pub struct MockEventPublisher {
    pub events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl MockEventPublisher {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish(&self, events: Vec<SyncEvent>) -> Result<(), PortError> {
        self.events.lock().unwrap().extend(events);
        Ok(())
    }
}

/// Scripted source: each fetch pops the next batch; an exhausted script
/// returns an empty fetch.
pub struct MockSource {
    kind: IntegrationKind,
    batches: Mutex<VecDeque<Result<Vec<ExternalAlert>, FetchError>>>,
}

impl MockSource {
    pub fn new(kind: IntegrationKind) -> Self {
        Self {
            kind,
            batches: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_batch(self, alerts: Vec<ExternalAlert>) -> Self {
        self.batches.lock().unwrap().push_back(Ok(alerts));
        self
    }

    pub fn push_failure(self, error: FetchError) -> Self {
        self.batches.lock().unwrap().push_back(Err(error));
        self
    }
}

#[async_trait]
impl AlertSource for MockSource {
    fn kind(&self) -> IntegrationKind {
        self.kind
    }

    async fn fetch(
        &self,
        _integration: &Integration,
        _known_tags: &[String],
    ) -> Result<Vec<ExternalAlert>, FetchError> {
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
