// Complaint domain types shared by the store, the transition engine and the views

pub mod status;
pub mod submit;
pub mod suggest;
pub mod view;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::priority::Priority;

pub use status::{ComplaintStatus, ParseStatusError, STATUS_CYCLE};
pub use submit::{submit_complaint, SubmissionError, SubmissionForm};
pub use suggest::{suggest_category_and_priority, Suggestion};
pub use view::{ComplaintView, StatusFilter, ViewStats};

/// Categories offered by the submission form
pub const CATEGORIES: [&str; 6] = [
    "General",
    "Water",
    "Electricity",
    "Road",
    "Sanitation",
    "Internet",
];

pub const DEFAULT_CATEGORY: &str = "General";

/// Opaque identifier assigned by the record store.
///
/// Hosted stores hand back either integer or uuid keys depending on the
/// table definition, so both JSON numbers and strings decode into it. It is
/// always written back out as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

pub type ComplaintId = RecordId;

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => RecordId(n.to_string()),
            RawId::Text(s) => RecordId(s),
        })
    }
}

/// A user-submitted complaint as stored in the `complaints` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: ComplaintId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: ComplaintStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Complaint {
    pub fn has_evidence(&self) -> bool {
        self.image_url.is_some()
    }

    pub fn title_matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Row written by the submission flow. Status is always OPEN on insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub status: ComplaintStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
}

impl NewComplaint {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: default_category(),
            priority: Priority::Low,
            status: ComplaintStatus::Open,
            image_url: None,
            user_id: None,
            user_email: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn submitted_by(mut self, user_id: Option<String>, user_email: Option<String>) -> Self {
        self.user_id = user_id;
        self.user_email = user_email;
        self
    }
}

/// One row of the status history timeline.
///
/// Rows are produced by a trigger on the store side whenever `status`
/// changes; this crate only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: RecordId,
    pub complaint_id: ComplaintId,
    pub status: ComplaintStatus,
    pub changed_at: DateTime<Utc>,
}
