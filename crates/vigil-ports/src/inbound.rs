use async_trait::async_trait;

use crate::error::PortError;
use crate::types::ResyncStatus;

/// Operational hook: trigger an immediate reconciliation cycle for the
/// integration this handle is bound to, outside the scheduled cadence.
#[async_trait]
pub trait SyncControl: Send + Sync {
    async fn resync(&self) -> Result<ResyncStatus, PortError>;
}
