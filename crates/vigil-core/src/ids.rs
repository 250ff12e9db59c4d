use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alert::Fingerprint;
use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse(s: &str) -> Result<Self, DomainError> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| DomainError::InvalidId(stringify!($name).into()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(UserId);
define_id!(IntegrationId);

/// Internal service reference. Services themselves live outside the sync
/// engine; the engine only routes alerts to their ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceId(i64);

impl ServiceId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite alert key: `{fingerprint}:{service_id}`.
///
/// One external alert condition legitimately manifests against every
/// service bound to its routing tag; each manifestation is its own row,
/// and this key is what makes re-syncing the same condition idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(String);

impl AlertId {
    pub fn new(fingerprint: &Fingerprint, service_id: ServiceId) -> Self {
        Self(format!("{}:{}", fingerprint.as_str(), service_id.value()))
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let (fp, svc) = s
            .rsplit_once(':')
            .ok_or_else(|| DomainError::InvalidAlertId(s.into()))?;
        if fp.is_empty() || svc.parse::<i64>().is_err() {
            return Err(DomainError::InvalidAlertId(s.into()));
        }
        Ok(Self(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Service half of the composite key.
    pub fn service_id(&self) -> ServiceId {
        // Infallible for ids built through `new`/`parse`.
        let svc = self.0.rsplit_once(':').map(|(_, s)| s).unwrap_or("0");
        ServiceId::new(svc.parse().unwrap_or(0))
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
