pub mod datadog;
pub mod grafana;

use std::collections::HashMap;
use std::sync::Arc;

use vigil_core::integration::IntegrationKind;
use vigil_ports::outbound::AlertSource;

pub use datadog::DatadogSource;
pub use grafana::GrafanaSource;

/// Lookup table of source adapters keyed by integration kind. Adding a
/// backend means adding an adapter and one entry here.
pub fn build_source_registry(
    client: reqwest::Client,
) -> HashMap<IntegrationKind, Arc<dyn AlertSource>> {
    let mut sources: HashMap<IntegrationKind, Arc<dyn AlertSource>> = HashMap::new();
    sources.insert(
        IntegrationKind::Grafana,
        Arc::new(GrafanaSource::new(client.clone())),
    );
    sources.insert(
        IntegrationKind::Datadog,
        Arc::new(DatadogSource::new(client)),
    );
    sources
}
