use tracing::debug;

use super::{Complaint, ComplaintStatus};
use crate::session::Session;
use crate::store::{ComplaintQuery, ComplaintStore, StoreError};
use crate::workflow::SetStatusOutcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ComplaintStatus),
}

impl StatusFilter {
    pub fn admits(self, status: ComplaintStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }

    pub fn status(self) -> Option<ComplaintStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status),
        }
    }
}

impl From<Option<ComplaintStatus>> for StatusFilter {
    fn from(status: Option<ComplaintStatus>) -> Self {
        status.map_or(StatusFilter::All, StatusFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

/// Command-local copy of the complaints a view is showing.
///
/// Changing the filter or the search reloads the whole collection. A
/// confirmed status change replaces the one record in place.
#[derive(Debug, Clone, Default)]
pub struct ComplaintView {
    scope: ComplaintQuery,
    filter: StatusFilter,
    search: String,
    complaints: Vec<Complaint>,
}

impl ComplaintView {
    /// View over every complaint (admin listing)
    pub fn all() -> Self {
        Self::default()
    }

    /// View over one submitter's complaints
    pub fn owned_by(user_id: impl Into<String>) -> Self {
        Self {
            scope: ComplaintQuery::owned_by(user_id),
            ..Self::default()
        }
    }

    /// Admins see everything; everyone else sees their own complaints
    pub fn for_session(session: &Session) -> Self {
        if session.is_admin() {
            Self::all()
        } else {
            Self::owned_by(session.user_id.clone())
        }
    }

    pub async fn reload(&mut self, store: &dyn ComplaintStore) -> Result<(), StoreError> {
        self.complaints = store.list(&self.scope).await?;
        debug!(count = self.complaints.len(), "Complaint view reloaded");
        Ok(())
    }

    pub async fn set_filter(
        &mut self,
        filter: StatusFilter,
        store: &dyn ComplaintStore,
    ) -> Result<(), StoreError> {
        self.filter = filter;
        self.reload(store).await
    }

    pub async fn set_search(
        &mut self,
        search: impl Into<String>,
        store: &dyn ComplaintStore,
    ) -> Result<(), StoreError> {
        self.search = search.into();
        self.reload(store).await
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn complaints(&self) -> &[Complaint] {
        &self.complaints
    }

    /// Records passing the status filter and the title search
    pub fn visible(&self) -> Vec<&Complaint> {
        let needle = self.search.trim();
        self.complaints
            .iter()
            .filter(|c| self.filter.admits(c.status))
            .filter(|c| needle.is_empty() || c.title_matches(needle))
            .collect()
    }

    /// Counts over the whole loaded collection, ignoring filter and search
    pub fn stats(&self) -> ViewStats {
        self.complaints
            .iter()
            .fold(ViewStats::default(), |mut stats, complaint| {
                stats.total += 1;
                match complaint.status {
                    ComplaintStatus::Open => stats.open += 1,
                    ComplaintStatus::InProgress => stats.in_progress += 1,
                    ComplaintStatus::Resolved => stats.resolved += 1,
                }
                stats
            })
    }

    /// Swap in a fresh copy of one record; false if it is not loaded
    pub fn replace(&mut self, record: Complaint) -> bool {
        match self.complaints.iter_mut().find(|c| c.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Fold a status change into the view. Unconfirmed changes leave it as is.
    pub fn apply(&mut self, outcome: &SetStatusOutcome) -> bool {
        match outcome.record() {
            Some(record) => self.replace(record.clone()),
            None => false,
        }
    }
}
