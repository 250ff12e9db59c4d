use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use vigil_core::integration::IntegrationKind;
use vigil_ports::error::PortError;
use vigil_ports::inbound::SyncControl;
use vigil_ports::outbound::{AlertStore, EventPublisher, IntegrationRegistry, TagIndex};
use vigil_ports::types::{CycleOutcome, ResyncStatus};

use crate::cycle::ReconciliationCycle;
use crate::error::AppError;

/// Serializes cycle execution for one integration.
///
/// At most one cycle may be in flight per integration at any time: a
/// late-finishing cycle overlapping a newer one could sweep rows the
/// newer cycle just inserted. A request arriving while busy is skipped
/// and logged, never queued. Scheduled ticks and manual resyncs share
/// the same guard.
pub struct CycleRunner<R, T, S, EP>
where
    R: IntegrationRegistry,
    T: TagIndex,
    S: AlertStore,
    EP: EventPublisher,
{
    cycle: ReconciliationCycle<R, T, S, EP>,
    in_flight: Mutex<()>,
}

impl<R, T, S, EP> CycleRunner<R, T, S, EP>
where
    R: IntegrationRegistry,
    T: TagIndex,
    S: AlertStore,
    EP: EventPublisher,
{
    pub fn new(cycle: ReconciliationCycle<R, T, S, EP>) -> Self {
        Self {
            cycle,
            in_flight: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> IntegrationKind {
        self.cycle.kind()
    }

    /// Run a cycle unless one is already in flight; `None` means skipped.
    pub async fn try_run(&self) -> Option<Result<Option<CycleOutcome>, AppError>> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            info!(source = %self.kind(), "cycle already in flight, skipping");
            return None;
        };
        Some(self.cycle.run().await)
    }
}

#[async_trait]
impl<R, T, S, EP> SyncControl for CycleRunner<R, T, S, EP>
where
    R: IntegrationRegistry,
    T: TagIndex,
    S: AlertStore,
    EP: EventPublisher,
{
    async fn resync(&self) -> Result<ResyncStatus, PortError> {
        match self.try_run().await {
            None => Ok(ResyncStatus::SkippedBusy),
            Some(Ok(None)) => Ok(ResyncStatus::SkippedDisabled),
            Some(Ok(Some(outcome))) => Ok(ResyncStatus::Completed(outcome)),
            Some(Err(AppError::Port(e))) => Err(e),
            Some(Err(AppError::Fetch(e))) => Err(PortError::Connection(e.to_string())),
            Some(Err(e)) => Err(PortError::Persistence(e.to_string())),
        }
    }
}
