use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use vigil_core::alert::{ExternalAlert, Fingerprint};
use vigil_core::integration::{Integration, IntegrationKind};
use vigil_ports::error::FetchError;
use vigil_ports::outbound::AlertSource;

/// Label key carrying the routing tag, unless the integration overrides
/// it with a `tag_label` credential.
pub const DEFAULT_TAG_LABEL: &str = "service";

const ALERTS_PATH: &str = "/api/alertmanager/grafana/api/v2/alerts";

/// Reference source adapter: Grafana's Alertmanager-compatible API.
pub struct GrafanaSource {
    client: reqwest::Client,
}

impl GrafanaSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Alertmanager-shaped alert. Everything is optional at the wire level;
/// normalization decides what is salvageable.
#[derive(Debug, Deserialize)]
struct AmAlert {
    fingerprint: Option<String>,
    status: Option<AmStatus>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
    #[serde(rename = "startsAt")]
    starts_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "generatorURL")]
    generator_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AmStatus {
    state: Option<String>,
}

/// Typed extraction with defaults; untyped label/annotation maps stop
/// here. Returns the normalized alerts and how many items were skipped
/// as malformed.
fn normalize(alerts: Vec<AmAlert>, tag_label: &str) -> (Vec<ExternalAlert>, usize) {
    let mut normalized = Vec::with_capacity(alerts.len());
    let mut skipped = 0;

    for alert in alerts {
        let fingerprint = match alert.fingerprint.and_then(|fp| Fingerprint::new(fp).ok()) {
            Some(fp) => fp,
            None => {
                debug!("alert without fingerprint, skipping");
                skipped += 1;
                continue;
            }
        };

        let state = alert
            .status
            .and_then(|s| s.state)
            .unwrap_or_else(|| "active".into());

        let mut external = ExternalAlert::new(fingerprint, state);
        external.tag_label = alert.labels.get(tag_label).cloned();
        external.name = alert.labels.get("alertname").cloned();
        external.summary = alert
            .annotations
            .get("summary")
            .or_else(|| alert.annotations.get("description"))
            .cloned();
        external.runbook_url = alert.annotations.get("runbook_url").cloned();
        external.started_at = alert.starts_at;
        external.updated_at = alert.updated_at;
        external.generator_url = alert.generator_url;
        normalized.push(external);
    }

    (normalized, skipped)
}

#[async_trait]
impl AlertSource for GrafanaSource {
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Grafana
    }

    async fn fetch(
        &self,
        integration: &Integration,
        known_tags: &[String],
    ) -> Result<Vec<ExternalAlert>, FetchError> {
        let token = integration
            .credential("api_token")
            .ok_or_else(|| FetchError::Auth("missing api_token credential".into()))?;
        let tag_label = integration
            .credential("tag_label")
            .unwrap_or(DEFAULT_TAG_LABEL);

        let url = format!("{}{ALERTS_PATH}", integration.external_url.trim_end_matches('/'));
        let mut request = self.client.get(&url).bearer_auth(token);
        if !known_tags.is_empty() {
            // Scope the query to alerts that can possibly route.
            let matcher = format!("{tag_label}=~\"{}\"", known_tags.join("|"));
            request = request.query(&[("filter", matcher)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::Auth(format!(
                    "grafana rejected credentials: {}",
                    response.status()
                )));
            }
            status if !status.is_success() => {
                return Err(FetchError::InvalidResponse(format!(
                    "unexpected status {status}"
                )));
            }
            _ => {}
        }

        let payload: Vec<AmAlert> = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        let (alerts, skipped) = normalize(payload, tag_label);
        if skipped > 0 {
            warn!(skipped, "skipped malformed grafana alerts");
        }
        Ok(alerts)
    }
}
