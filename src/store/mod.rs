// Complaint record store: the persistence boundary of the application.
// The hosted backend owns the rows; everything here is request/response.

pub mod auth;
pub mod errors;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;
pub mod storage;
pub mod supabase;

use async_trait::async_trait;

use crate::complaints::{
    Complaint, ComplaintId, ComplaintStatus, NewComplaint, StatusHistoryEntry,
};

pub use auth::{AuthClient, AuthUser, SignUpRequest};
pub use errors::StoreError;
pub use memory::InMemoryComplaintStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteComplaintStore;
pub use storage::ImageStorage;
pub use supabase::SupabaseComplaintStore;

/// Criteria for a full collection load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintQuery {
    /// Restrict to one submitter
    pub owner: Option<String>,
    pub status: Option<ComplaintStatus>,
    /// Case-insensitive substring of the title
    pub title_contains: Option<String>,
}

impl ComplaintQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn owned_by(user_id: impl Into<String>) -> Self {
        Self {
            owner: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: Option<ComplaintStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_title_containing(mut self, needle: Option<String>) -> Self {
        self.title_contains = needle.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn matches(&self, complaint: &Complaint) -> bool {
        if let Some(owner) = &self.owner {
            if complaint.user_id.as_deref() != Some(owner.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if complaint.status != status {
                return false;
            }
        }
        if let Some(needle) = &self.title_contains {
            if !complaint.title_matches(needle) {
                return false;
            }
        }
        true
    }
}

/// Trait for record store operations to enable testing with mocks
///
/// `update_status` and `read_by_id` are the two calls the transition engine
/// depends on. Neither is atomic with respect to any earlier read.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Set `status` on the record keyed by `id`; returns the number of rows
    /// affected, which is zero for an unknown id.
    async fn update_status(
        &self,
        id: &ComplaintId,
        status: ComplaintStatus,
    ) -> Result<u64, StoreError>;

    /// Point lookup by identifier
    async fn read_by_id(&self, id: &ComplaintId) -> Result<Option<Complaint>, StoreError>;

    /// Full load, newest first
    async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>, StoreError>;

    /// Insert a new complaint and return the stored row
    async fn insert(&self, complaint: &NewComplaint) -> Result<Complaint, StoreError>;

    /// Status timeline for one complaint, oldest first
    async fn status_history(
        &self,
        id: &ComplaintId,
    ) -> Result<Vec<StatusHistoryEntry>, StoreError>;
}
