use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use vigil_core::alert::{ExternalAlert, Fingerprint};
use vigil_core::integration::{Integration, IntegrationKind};
use vigil_ports::error::FetchError;
use vigil_ports::outbound::AlertSource;

const MONITORS_PATH: &str = "/api/v1/monitor";
const SERVICE_TAG_PREFIX: &str = "service:";

/// Datadog monitors API. Monitor ids become fingerprints (prefixed so
/// they can never collide with another backend's namespace) and the
/// first `service:` tag becomes the routing tag.
pub struct DatadogSource {
    client: reqwest::Client,
}

impl DatadogSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DdMonitor {
    id: Option<i64>,
    name: Option<String>,
    message: Option<String>,
    overall_state: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
}

fn routing_tag(tags: &[String]) -> Option<String> {
    tags.iter()
        .find_map(|t| t.strip_prefix(SERVICE_TAG_PREFIX))
        .map(str::to_string)
}

fn normalize(monitors: Vec<DdMonitor>, base_url: &str) -> (Vec<ExternalAlert>, usize) {
    let mut normalized = Vec::with_capacity(monitors.len());
    let mut skipped = 0;

    for monitor in monitors {
        let Some(id) = monitor.id else {
            debug!("monitor without id, skipping");
            skipped += 1;
            continue;
        };
        // Monitor ids are only unique within Datadog; prefix them so the
        // fingerprint namespace cannot collide with other backends.
        let fingerprint = match Fingerprint::new(format!("dd-monitor-{id}")) {
            Ok(fp) => fp,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        let state = monitor.overall_state.unwrap_or_else(|| "Alert".into());
        let mut external = ExternalAlert::new(fingerprint, state);
        external.tag_label = routing_tag(&monitor.tags);
        external.name = monitor.name;
        external.summary = monitor.message;
        external.started_at = monitor.created;
        external.updated_at = monitor.modified;
        external.generator_url = Some(format!(
            "{}/monitors/{id}",
            base_url.trim_end_matches('/')
        ));
        normalized.push(external);
    }

    (normalized, skipped)
}

#[async_trait]
impl AlertSource for DatadogSource {
    fn kind(&self) -> IntegrationKind {
        IntegrationKind::Datadog
    }

    async fn fetch(
        &self,
        integration: &Integration,
        known_tags: &[String],
    ) -> Result<Vec<ExternalAlert>, FetchError> {
        let api_key = integration
            .credential("api_key")
            .ok_or_else(|| FetchError::Auth("missing api_key credential".into()))?;
        let app_key = integration
            .credential("app_key")
            .ok_or_else(|| FetchError::Auth("missing app_key credential".into()))?;

        let url = format!(
            "{}{MONITORS_PATH}",
            integration.external_url.trim_end_matches('/')
        );
        let mut request = self
            .client
            .get(&url)
            .header("DD-API-KEY", api_key)
            .header("DD-APPLICATION-KEY", app_key);
        if !known_tags.is_empty() {
            let monitor_tags = known_tags
                .iter()
                .map(|t| format!("{SERVICE_TAG_PREFIX}{t}"))
                .collect::<Vec<_>>()
                .join(",");
            request = request.query(&[("monitor_tags", monitor_tags)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::Auth(format!(
                    "datadog rejected credentials: {}",
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

        let payload: Vec<DdMonitor> = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        let (alerts, skipped) = normalize(payload, &integration.external_url);
        if skipped > 0 {
            warn!(skipped, "skipped malformed datadog monitors");
        }
        Ok(alerts)
    }
}
