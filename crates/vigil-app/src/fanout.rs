use tracing::info;

use vigil_core::alert::ExternalAlert;
use vigil_core::ids::ServiceId;
use vigil_ports::outbound::TagIndex;

use crate::error::AppError;

/// Expands one external alert into `(alert, service)` pairs, one per
/// service bound to the alert's routing tag.
///
/// One upstream condition deliberately becomes visible against every
/// service sharing the tag: over-surfacing to all relevant owners beats
/// under-surfacing. An alert without a tag, or whose tag binds no
/// services, yields zero pairs and is dropped without error.
pub struct FanoutResolver<T: TagIndex> {
    tags: T,
}

impl<T: TagIndex> FanoutResolver<T> {
    pub fn new(tags: T) -> Self {
        Self { tags }
    }

    /// All tag names currently known, used to scope adapter queries.
    pub async fn known_tags(&self) -> Result<Vec<String>, AppError> {
        Ok(self.tags.all_tag_names().await?)
    }

    pub async fn resolve(
        &self,
        external: &ExternalAlert,
    ) -> Result<Vec<(ExternalAlert, ServiceId)>, AppError> {
        let Some(tag) = external.tag_label.as_deref() else {
            info!(
                fingerprint = %external.fingerprint,
                "alert carries no routing tag, dropping"
            );
            return Ok(Vec::new());
        };

        let service_ids = self.tags.service_ids_for_tag(tag).await?;
        if service_ids.is_empty() {
            info!(
                fingerprint = %external.fingerprint,
                tag,
                "routing tag bound to no services, dropping"
            );
            return Ok(Vec::new());
        }

        Ok(service_ids
            .into_iter()
            .map(|service_id| (external.clone(), service_id))
            .collect())
    }
}
