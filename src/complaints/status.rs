use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle stage of a complaint.
///
/// The wire form is the upper-case token used by the record store
/// (`OPEN`, `IN_PROGRESS`, `RESOLVED`). Decoding any other value fails,
/// so a `Complaint` can never carry a status outside this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    Open,
    InProgress,
    Resolved,
}

/// Cyclic order walked by `advance`.
pub const STATUS_CYCLE: [ComplaintStatus; 3] = [
    ComplaintStatus::Open,
    ComplaintStatus::InProgress,
    ComplaintStatus::Resolved,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown complaint status '{value}' (expected OPEN, IN_PROGRESS or RESOLVED)")]
pub struct ParseStatusError {
    pub value: String,
}

impl ComplaintStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Open => "OPEN",
            ComplaintStatus::InProgress => "IN_PROGRESS",
            ComplaintStatus::Resolved => "RESOLVED",
        }
    }

    /// Human label used in terminal output
    pub fn label(self) -> &'static str {
        match self {
            ComplaintStatus::Open => "Open",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ComplaintStatus::Open => "🔴",
            ComplaintStatus::InProgress => "🔵",
            ComplaintStatus::Resolved => "🟢",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the lower-case and dashed spellings people type on a command line
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "OPEN" => Ok(ComplaintStatus::Open),
            "IN_PROGRESS" => Ok(ComplaintStatus::InProgress),
            "RESOLVED" => Ok(ComplaintStatus::Resolved),
            _ => Err(ParseStatusError {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ComplaintStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        let parsed: ComplaintStatus = serde_json::from_str("\"RESOLVED\"").unwrap();
        assert_eq!(parsed, ComplaintStatus::Resolved);
    }

    #[test]
    fn test_unknown_status_is_rejected_on_decode() {
        assert!(serde_json::from_str::<ComplaintStatus>("\"CLOSED\"").is_err());
        assert!(serde_json::from_str::<ComplaintStatus>("\"open\"").is_err());
    }

    #[test]
    fn test_status_from_str_accepts_cli_spellings() {
        assert_eq!("open".parse::<ComplaintStatus>(), Ok(ComplaintStatus::Open));
        assert_eq!(
            "in-progress".parse::<ComplaintStatus>(),
            Ok(ComplaintStatus::InProgress)
        );
        assert_eq!(
            " RESOLVED ".parse::<ComplaintStatus>(),
            Ok(ComplaintStatus::Resolved)
        );

        let err = "pending".parse::<ComplaintStatus>().unwrap_err();
        assert_eq!(err.value, "pending");
    }
}
