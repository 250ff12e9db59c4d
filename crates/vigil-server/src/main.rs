mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vigil_adapters::persistence::SqliteDb;
use vigil_adapters::sources::build_source_registry;
use vigil_app::cycle::ReconciliationCycle;
use vigil_app::fanout::FanoutResolver;
use vigil_app::runner::CycleRunner;
use vigil_app::scheduler::SyncScheduler;
use vigil_app::upsert::AlertUpsertEngine;
use vigil_core::integration::{Integration, IntegrationKind};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VIGIL_CONFIG").ok())
        .unwrap_or_else(|| "vigil.toml".into());
    let config = ServerConfig::load(&config_path)?;

    let db = SqliteDb::new(&config.database_url)
        .await
        .context("opening database")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("building http client")?;
    let sources = build_source_registry(client);

    let shutdown = CancellationToken::new();
    let mut handles = Vec::new();

    for integration_config in &config.integrations {
        let kind = match IntegrationKind::parse(&integration_config.kind) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(error = %e, "ignoring integration with unknown kind");
                continue;
            }
        };

        let mut integration = Integration::new(kind, &integration_config.external_url);
        integration.credentials = integration_config.credentials.clone();
        db.upsert_integration(&integration, integration_config.enabled)
            .await
            .context("seeding integration registry")?;

        if !integration_config.enabled {
            info!(source = %kind, "integration disabled in config");
            continue;
        }
        let Some(source) = sources.get(&kind) else {
            warn!(source = %kind, "no source adapter registered, skipping");
            continue;
        };

        let runner = Arc::new(CycleRunner::new(ReconciliationCycle::new(
            kind,
            db.clone(),
            source.clone(),
            FanoutResolver::new(db.clone()),
            AlertUpsertEngine::new(db.clone()),
            db.clone(),
        )));
        let scheduler = SyncScheduler::new(
            runner,
            config.poll_interval_for(integration_config),
            shutdown.clone(),
        );
        handles.push(tokio::spawn(scheduler.run()));
    }

    if handles.is_empty() {
        warn!("no enabled integrations configured, nothing will sync");
    }

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("shutdown requested, letting in-flight cycles finish");
    shutdown.cancel();
    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
