use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::integration::IntegrationKind;

/// Observability events emitted by each reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyncEvent {
    CycleFetched(CycleFetched),
    CycleUpserted(CycleUpserted),
    CycleFailed(CycleFailed),
    CycleSwept(CycleSwept),
}

impl SyncEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::CycleFetched(e) => e.occurred_at,
            Self::CycleUpserted(e) => e.occurred_at,
            Self::CycleFailed(e) => e.occurred_at,
            Self::CycleSwept(e) => e.occurred_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CycleFetched(_) => "cycle.fetched",
            Self::CycleUpserted(_) => "cycle.upserted",
            Self::CycleFailed(_) => "cycle.failed",
            Self::CycleSwept(_) => "cycle.swept",
        }
    }

    pub fn source(&self) -> IntegrationKind {
        match self {
            Self::CycleFetched(e) => e.source,
            Self::CycleUpserted(e) => e.source,
            Self::CycleFailed(e) => e.source,
            Self::CycleSwept(e) => e.source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleFetched {
    pub source: IntegrationKind,
    pub fetched: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleUpserted {
    pub source: IntegrationKind,
    pub upserted: u64,
    pub failed: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Emitted when the fetch itself fails and the cycle aborts before writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleFailed {
    pub source: IntegrationKind,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSwept {
    pub source: IntegrationKind,
    pub deleted: u64,
    pub occurred_at: DateTime<Utc>,
}
