use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

fn default_database_url() -> String {
    "sqlite:vigil.db?mode=rwc".into()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Default seconds between reconciliation cycles; integrations may
    /// override it individually.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub integrations: Vec<IntegrationConfig>,
}

#[derive(Debug, Deserialize)]
pub struct IntegrationConfig {
    pub kind: String,
    pub external_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    pub poll_interval_secs: Option<u64>,
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn poll_interval_for(&self, integration: &IntegrationConfig) -> Duration {
        Duration::from_secs(
            integration
                .poll_interval_secs
                .unwrap_or(self.poll_interval_secs),
        )
    }
}
