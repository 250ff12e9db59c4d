use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use vigil_ports::outbound::{AlertStore, EventPublisher, IntegrationRegistry, TagIndex};

use crate::runner::CycleRunner;

/// Drives one integration's reconciliation on a fixed cadence.
///
/// One scheduler task per integration kind; integrations sync in parallel
/// with each other but sequentially within themselves via the runner's
/// in-flight guard. The first cycle runs immediately at startup so alert
/// state is populated without waiting a full interval. Cancellation is
/// honored between cycles only: an in-flight fetch/upsert batch finishes
/// rather than leaving a partial sweep behind.
pub struct SyncScheduler<R, T, S, EP>
where
    R: IntegrationRegistry,
    T: TagIndex,
    S: AlertStore,
    EP: EventPublisher,
{
    runner: Arc<CycleRunner<R, T, S, EP>>,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl<R, T, S, EP> SyncScheduler<R, T, S, EP>
where
    R: IntegrationRegistry,
    T: TagIndex,
    S: AlertStore,
    EP: EventPublisher,
{
    pub fn new(
        runner: Arc<CycleRunner<R, T, S, EP>>,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            runner,
            poll_interval,
            shutdown,
        }
    }

    /// One scheduler beat. Public so cycles can be driven directly in
    /// tests and from operational tooling, without wall-clock timers.
    pub async fn tick(&self) {
        match self.runner.try_run().await {
            None => {} // busy, already logged by the runner
            Some(Ok(None)) => {} // disabled, already logged by the cycle
            Some(Ok(Some(outcome))) => {
                info!(
                    source = %self.runner.kind(),
                    upserted = outcome.upserted,
                    failed = outcome.failed,
                    deleted = outcome.deleted,
                    "reconciliation cycle complete"
                );
            }
            Some(Err(e)) => {
                error!(source = %self.runner.kind(), error = %e, "reconciliation cycle failed");
            }
        }
    }

    pub async fn run(self) {
        info!(
            source = %self.runner.kind(),
            interval_secs = self.poll_interval.as_secs(),
            "sync scheduler started"
        );

        // The first tick of a tokio interval completes immediately, which
        // doubles as the startup cycle. Ticks missed while a cycle is
        // running are skipped, not queued.
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => self.tick().await,
            }
        }

        info!(source = %self.runner.kind(), "sync scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::ReconciliationCycle;
    use crate::fanout::FanoutResolver;
    use crate::testutil::*;
    use crate::upsert::AlertUpsertEngine;
    use vigil_core::integration::IntegrationKind;

    fn make_scheduler(
        source: MockSource,
        store: MockAlertStore,
        shutdown: CancellationToken,
    ) -> SyncScheduler<MockRegistry, MockTagIndex, MockAlertStore, MockEventPublisher> {
        let runner = Arc::new(CycleRunner::new(ReconciliationCycle::new(
            IntegrationKind::Grafana,
            MockRegistry::enabled(IntegrationKind::Grafana),
            Arc::new(source),
            FanoutResolver::new(MockTagIndex::with_binding("prod", &[5])),
            AlertUpsertEngine::new(store),
            MockEventPublisher::default(),
        )));
        SyncScheduler::new(runner, Duration::from_secs(60), shutdown)
    }

    #[tokio::test]
    async fn tick_runs_one_cycle() {
        let store = MockAlertStore::default();
        let source = MockSource::new(IntegrationKind::Grafana)
            .push_batch(vec![make_external("abc", "prod")]);
        let scheduler = make_scheduler(source, store.clone(), CancellationToken::new());

        scheduler.tick().await;

        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn cancelled_scheduler_exits_without_running() {
        let store = MockAlertStore::default();
        let source = MockSource::new(IntegrationKind::Grafana)
            .push_batch(vec![make_external("abc", "prod")]);
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let scheduler = make_scheduler(source, store.clone(), shutdown);

        scheduler.run().await;

        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_runs_initial_cycle_then_ticks() {
        let store = MockAlertStore::default();
        let source = MockSource::new(IntegrationKind::Grafana)
            .push_batch(vec![make_external("abc", "prod")])
            .push_batch(vec![make_external("abc", "prod"), make_external("def", "prod")]);
        let shutdown = CancellationToken::new();
        let scheduler = make_scheduler(source, store.clone(), shutdown.clone());

        let handle = tokio::spawn(scheduler.run());

        // Initial cycle fires immediately, before any interval elapses.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.row_count(), 1);

        // Next tick lands after the poll interval.
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.row_count(), 2);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
