use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Firing,
    Resolved,
}

impl Status {
    /// Map a backend's free-form state string onto the canonical status.
    ///
    /// Unknown states are treated as firing: surfacing a stale alert is
    /// recoverable, hiding a live one is not.
    pub fn from_external(state: &str) -> Self {
        match state.to_lowercase().as_str() {
            "resolved" | "ok" | "normal" | "inactive" => Status::Resolved,
            _ => Status::Firing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Firing => "firing",
            Status::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "firing" => Some(Status::Firing),
            "resolved" => Some(Status::Resolved),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_synonyms_map_to_resolved() {
        for s in ["resolved", "OK", "Normal", "inactive"] {
            assert_eq!(Status::from_external(s), Status::Resolved);
        }
    }

    #[test]
    fn firing_and_unknown_map_to_firing() {
        for s in ["firing", "active", "alerting", "Alert", "weird-state"] {
            assert_eq!(Status::from_external(s), Status::Firing);
        }
    }

    #[test]
    fn canonical_string_round_trips() {
        assert_eq!(Status::parse(Status::Firing.as_str()), Some(Status::Firing));
        assert_eq!(
            Status::parse(Status::Resolved.as_str()),
            Some(Status::Resolved)
        );
        assert_eq!(Status::parse("nope"), None);
    }
}
