use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("connection error: {0}")]
    Connection(String),
}

/// Failure talking to an external backend. Always aborts the cycle before
/// any write; a fetch failure must never look like "zero alerts".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("backend unreachable: {0}")]
    Connection(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
