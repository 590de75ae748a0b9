use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{ComplaintQuery, ComplaintStore, StoreError};
use crate::complaints::{
    Complaint, ComplaintId, ComplaintStatus, NewComplaint, RecordId, StatusHistoryEntry,
};

/// Process-local record store.
///
/// Behaves like the hosted table including its status-history trigger:
/// every update that changes `status` appends a history row.
#[derive(Debug, Default)]
pub struct InMemoryComplaintStore {
    rows: RwLock<BTreeMap<ComplaintId, Complaint>>,
    history: RwLock<Vec<StatusHistoryEntry>>,
    next_id: AtomicU64,
    next_history_id: AtomicU64,
}

impl InMemoryComplaintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row with a caller-chosen id, replacing any existing one
    pub async fn seed(&self, complaint: Complaint) {
        self.rows
            .write()
            .await
            .insert(complaint.id.clone(), complaint);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn allocate_id(&self) -> ComplaintId {
        RecordId::from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ComplaintStore for InMemoryComplaintStore {
    async fn update_status(
        &self,
        id: &ComplaintId,
        status: ComplaintStatus,
    ) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.get_mut(id) else {
            return Ok(0);
        };

        let changed = row.status != status;
        row.status = status;

        if changed {
            let entry = StatusHistoryEntry {
                id: RecordId::from(self.next_history_id.fetch_add(1, Ordering::SeqCst) + 1),
                complaint_id: id.clone(),
                status,
                changed_at: Utc::now(),
            };
            self.history.write().await.push(entry);
        }

        Ok(1)
    }

    async fn read_by_id(&self, id: &ComplaintId) -> Result<Option<Complaint>, StoreError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>, StoreError> {
        let rows = self.rows.read().await;
        let mut complaints: Vec<Complaint> = rows
            .values()
            .filter(|complaint| query.matches(complaint))
            .cloned()
            .collect();

        // Newest first; rows without a timestamp sort last
        complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(complaints)
    }

    async fn insert(&self, complaint: &NewComplaint) -> Result<Complaint, StoreError> {
        let stored = Complaint {
            id: self.allocate_id(),
            title: complaint.title.clone(),
            description: complaint.description.clone(),
            category: complaint.category.clone(),
            priority: complaint.priority,
            status: complaint.status,
            image_url: complaint.image_url.clone(),
            user_id: complaint.user_id.clone(),
            user_email: complaint.user_email.clone(),
            created_at: Some(Utc::now()),
        };

        self.rows
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn status_history(
        &self,
        id: &ComplaintId,
    ) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        let history = self.history.read().await;
        let mut entries: Vec<StatusHistoryEntry> = history
            .iter()
            .filter(|entry| &entry.complaint_id == id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.changed_at.cmp(&b.changed_at));
        Ok(entries)
    }
}
