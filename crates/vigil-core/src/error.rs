use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("fingerprint must not be empty")]
    EmptyFingerprint,
    #[error("alert has no routing tag")]
    MissingRoutingTag,
    #[error("invalid alert id: {0}")]
    InvalidAlertId(String),
    #[error("unknown integration kind: {0}")]
    UnknownIntegrationKind(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
}
