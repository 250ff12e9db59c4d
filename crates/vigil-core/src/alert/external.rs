use chrono::{DateTime, Utc};

use super::Fingerprint;

/// Normalized alert as returned by a source adapter, before fanout.
///
/// Adapters parse backend payloads into this shape at the boundary and
/// never let untyped label/annotation maps travel further. Everything
/// except `fingerprint` and `state` is optional; `tag_label` absent means
/// the alert cannot be routed and will be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalAlert {
    pub fingerprint: Fingerprint,
    pub state: String,
    pub tag_label: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub generator_url: Option<String>,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub runbook_url: Option<String>,
}

impl ExternalAlert {
    pub fn new(fingerprint: Fingerprint, state: impl Into<String>) -> Self {
        Self {
            fingerprint,
            state: state.into(),
            tag_label: None,
            started_at: None,
            updated_at: None,
            generator_url: None,
            name: None,
            summary: None,
            runbook_url: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_label = Some(tag.into());
        self
    }
}
