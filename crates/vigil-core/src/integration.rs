use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::IntegrationId;

/// External monitoring backend type. One adapter per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationKind {
    Grafana,
    Datadog,
}

impl IntegrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationKind::Grafana => "grafana",
            IntegrationKind::Datadog => "datadog",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.to_lowercase().as_str() {
            "grafana" => Ok(IntegrationKind::Grafana),
            "datadog" => Ok(IntegrationKind::Datadog),
            other => Err(DomainError::UnknownIntegrationKind(other.into())),
        }
    }

    pub fn all() -> &'static [IntegrationKind] {
        &[IntegrationKind::Grafana, IntegrationKind::Datadog]
    }
}

impl std::fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A configured, enabled connection to one external backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub id: IntegrationId,
    pub kind: IntegrationKind,
    pub external_url: String,
    pub credentials: BTreeMap<String, String>,
}

impl Integration {
    pub fn new(kind: IntegrationKind, external_url: impl Into<String>) -> Self {
        Self {
            id: IntegrationId::new(),
            kind,
            external_url: external_url.into(),
            credentials: BTreeMap::new(),
        }
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }
}
