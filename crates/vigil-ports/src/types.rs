use std::collections::HashSet;

/// Result of one reconciliation cycle. Ephemeral; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Composite ids successfully upserted this cycle. The sweep keeps
    /// exactly these rows.
    pub kept_ids: HashSet<String>,
    pub upserted: u64,
    pub failed: u64,
    pub deleted: u64,
}

/// What a manual resync request actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResyncStatus {
    Completed(CycleOutcome),
    /// Integration disabled or unconfigured.
    SkippedDisabled,
    /// A cycle for this integration was already in flight.
    SkippedBusy,
}
