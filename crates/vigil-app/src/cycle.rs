use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use vigil_core::events::{CycleFailed, CycleFetched, CycleSwept, CycleUpserted, SyncEvent};
use vigil_core::integration::IntegrationKind;
use vigil_ports::outbound::{
    AlertSource, AlertStore, EventPublisher, IntegrationRegistry, TagIndex,
};
use vigil_ports::types::CycleOutcome;

use crate::error::AppError;
use crate::fanout::FanoutResolver;
use crate::upsert::AlertUpsertEngine;

/// One full reconciliation pass for one integration:
/// fetch → fanout → upsert → sweep.
///
/// Failure consequences differ by stage. A fetch failure aborts before any
/// write and skips the sweep entirely — "no data" is not evidence of
/// "resolved". A per-alert failure is logged, counted, and excluded from
/// the kept set; the cycle carries on. The sweep runs strictly after every
/// upsert of the same cycle, scoped to this integration's rows.
pub struct ReconciliationCycle<R, T, S, EP>
where
    R: IntegrationRegistry,
    T: TagIndex,
    S: AlertStore,
    EP: EventPublisher,
{
    kind: IntegrationKind,
    registry: R,
    source: Arc<dyn AlertSource>,
    fanout: FanoutResolver<T>,
    engine: AlertUpsertEngine<S>,
    events: EP,
}

impl<R, T, S, EP> ReconciliationCycle<R, T, S, EP>
where
    R: IntegrationRegistry,
    T: TagIndex,
    S: AlertStore,
    EP: EventPublisher,
{
    pub fn new(
        kind: IntegrationKind,
        registry: R,
        source: Arc<dyn AlertSource>,
        fanout: FanoutResolver<T>,
        engine: AlertUpsertEngine<S>,
        events: EP,
    ) -> Self {
        Self {
            kind,
            registry,
            source,
            fanout,
            engine,
            events,
        }
    }

    pub fn kind(&self) -> IntegrationKind {
        self.kind
    }

    /// Run one cycle. `Ok(None)` means the integration is disabled or
    /// unconfigured and the cycle was skipped before doing anything.
    pub async fn run(&self) -> Result<Option<CycleOutcome>, AppError> {
        let Some(integration) = self.registry.get_by_kind(self.kind).await? else {
            warn!(source = %self.kind, "integration disabled or unconfigured, skipping cycle");
            return Ok(None);
        };

        let known_tags = self.fanout.known_tags().await?;

        let fetched = match self.source.fetch(&integration, &known_tags).await {
            Ok(alerts) => alerts,
            Err(e) => {
                error!(source = %self.kind, error = %e, "fetch failed, aborting cycle before any write");
                self.emit(SyncEvent::CycleFailed(CycleFailed {
                    source: self.kind,
                    reason: e.to_string(),
                    occurred_at: Utc::now(),
                }))
                .await;
                return Err(e.into());
            }
        };

        info!(source = %self.kind, fetched = fetched.len(), "fetched external alerts");
        self.emit(SyncEvent::CycleFetched(CycleFetched {
            source: self.kind,
            fetched: fetched.len() as u64,
            occurred_at: Utc::now(),
        }))
        .await;

        let mut outcome = CycleOutcome::default();
        // Rows whose upsert failed this cycle: kept out of `kept_ids`, but
        // also shielded from this cycle's sweep. A transient store failure
        // must not delete a previously-good row.
        let mut failed_ids: HashSet<String> = HashSet::new();

        for external in &fetched {
            let pairs = match self.fanout.resolve(external).await {
                Ok(pairs) => pairs,
                Err(e) => {
                    error!(
                        source = %self.kind,
                        fingerprint = %external.fingerprint,
                        error = %e,
                        "tag resolution failed, skipping alert"
                    );
                    outcome.failed += 1;
                    continue;
                }
            };

            for (external, service_id) in pairs {
                match self.engine.upsert(&external, service_id, self.kind).await {
                    Ok(id) => {
                        outcome.kept_ids.insert(id.to_string());
                        outcome.upserted += 1;
                    }
                    Err(e) => {
                        error!(
                            source = %self.kind,
                            fingerprint = %external.fingerprint,
                            service_id = %service_id,
                            error = %e,
                            "upsert failed, continuing cycle"
                        );
                        failed_ids
                            .insert(format!("{}:{}", external.fingerprint, service_id));
                        outcome.failed += 1;
                    }
                }
            }
        }

        self.emit(SyncEvent::CycleUpserted(CycleUpserted {
            source: self.kind,
            upserted: outcome.upserted,
            failed: outcome.failed,
            occurred_at: Utc::now(),
        }))
        .await;

        // Sweep strictly after all upserts, with exactly this cycle's ids.
        let mut retained = outcome.kept_ids.clone();
        retained.extend(failed_ids);
        match self.engine.sweep(self.kind, &retained).await {
            Ok(deleted) => {
                outcome.deleted = deleted;
                info!(source = %self.kind, deleted, "swept stale alerts");
                self.emit(SyncEvent::CycleSwept(CycleSwept {
                    source: self.kind,
                    deleted,
                    occurred_at: Utc::now(),
                }))
                .await;
            }
            Err(e) => {
                error!(
                    source = %self.kind,
                    error = %e,
                    "sweep failed, stale alerts remain until next cycle"
                );
            }
        }

        Ok(Some(outcome))
    }

    /// Event persistence is observability plumbing; its failures are
    /// logged, never allowed to alter cycle semantics.
    async fn emit(&self, event: SyncEvent) {
        if let Err(e) = self.events.publish(vec![event]).await {
            warn!(source = %self.kind, error = %e, "failed to publish sync event");
        }
    }
}
