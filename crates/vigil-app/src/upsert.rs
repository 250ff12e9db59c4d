use std::collections::HashSet;

use vigil_core::alert::{Alert, ExternalAlert};
use vigil_core::ids::{AlertId, ServiceId};
use vigil_core::integration::IntegrationKind;
use vigil_ports::outbound::AlertStore;

use crate::error::AppError;

/// Write side of the engine: turns a fanned-out pair into a canonical
/// alert row and hands it to the store.
///
/// The insert-or-partial-update guarantee lives in the store's single
/// atomic write; this layer only builds valid candidates and scopes the
/// sweep to one integration's rows.
pub struct AlertUpsertEngine<S: AlertStore> {
    store: S,
}

impl<S: AlertStore> AlertUpsertEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn upsert(
        &self,
        external: &ExternalAlert,
        service_id: ServiceId,
        source: IntegrationKind,
    ) -> Result<AlertId, AppError> {
        let candidate = Alert::from_external(external, service_id, source)?;
        self.store.upsert(&candidate).await?;
        Ok(candidate.id().clone())
    }

    pub async fn sweep(
        &self,
        source: IntegrationKind,
        kept_ids: &HashSet<String>,
    ) -> Result<u64, AppError> {
        Ok(self.store.delete_alerts_not_in(source, kept_ids).await?)
    }
}
