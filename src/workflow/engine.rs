use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn, Instrument};

use super::lifecycle::next_status;
use crate::complaints::{Complaint, ComplaintId, ComplaintStatus};
use crate::config::WorkflowConfig;
use crate::observability::OperationTimer;
use crate::store::{ComplaintStore, StoreError};
use crate::telemetry::{create_transition_span, generate_correlation_id};

#[derive(Debug, Error)]
pub enum TransitionError {
    /// The status write itself failed; nothing was changed locally
    #[error("failed to set complaint {id} to {target}: {source}")]
    MutationFailure {
        id: ComplaintId,
        target: ComplaintStatus,
        #[source]
        source: StoreError,
    },

    /// Advancing needs the current status and it could not be read
    #[error("could not read the current status of complaint {id}: {source}")]
    StatusLookup {
        id: ComplaintId,
        #[source]
        source: StoreError,
    },
}

impl TransitionError {
    pub fn store_error(&self) -> &StoreError {
        match self {
            TransitionError::MutationFailure { source, .. } => source,
            TransitionError::StatusLookup { source, .. } => source,
        }
    }
}

/// Why a written status could not be confirmed by reading it back
#[derive(Debug, Error)]
pub enum ReadbackFailure {
    #[error("read-back failed: {0}")]
    Store(#[source] StoreError),

    #[error("record not found on read-back")]
    NotFound,
}

/// Result of one advance along the cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub id: ComplaintId,
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
    /// Rows the store reports as updated; zero for an unknown id
    pub affected: u64,
}

#[derive(Debug)]
pub enum SetStatusOutcome {
    /// The write went through and this is the record as re-read afterwards.
    /// `affected == 0` means the row exists but the write matched nothing.
    Confirmed { complaint: Complaint, affected: u64 },
    /// The write was issued without error but could not be confirmed.
    /// Treat it as applied; do not refresh local state from it.
    Unconfirmed {
        id: ComplaintId,
        target: ComplaintStatus,
        affected: u64,
        failure: ReadbackFailure,
    },
}

impl SetStatusOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SetStatusOutcome::Confirmed { .. })
    }

    pub fn affected(&self) -> u64 {
        match self {
            SetStatusOutcome::Confirmed { affected, .. } => *affected,
            SetStatusOutcome::Unconfirmed { affected, .. } => *affected,
        }
    }

    pub fn record(&self) -> Option<&Complaint> {
        match self {
            SetStatusOutcome::Confirmed { complaint, .. } => Some(complaint),
            SetStatusOutcome::Unconfirmed { .. } => None,
        }
    }
}

/// The one place complaint status is changed.
///
/// Both operations go straight to the store; there is no locking between
/// concurrent transitions on the same id and the last write wins. No call is
/// retried.
#[derive(Clone)]
pub struct TransitionEngine {
    store: Arc<dyn ComplaintStore>,
    readback_delay: Duration,
}

impl std::fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("readback_delay", &self.readback_delay)
            .finish_non_exhaustive()
    }
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn ComplaintStore>, readback_delay: Duration) -> Self {
        Self {
            store,
            readback_delay,
        }
    }

    pub fn from_config(store: Arc<dyn ComplaintStore>, config: &WorkflowConfig) -> Self {
        Self::new(store, config.readback_delay())
    }

    pub fn readback_delay(&self) -> Duration {
        self.readback_delay
    }

    /// Move a complaint one step along the cycle.
    ///
    /// Looks up the current status first. `Ok(None)` means there is no such
    /// complaint; nothing was written.
    pub async fn advance_status(&self, id: &ComplaintId) -> Result<Option<Advance>, TransitionError> {
        let correlation_id = generate_correlation_id();
        let span = create_transition_span("advance_status", id, None, &correlation_id);

        async {
            let current = self
                .store
                .read_by_id(id)
                .await
                .map_err(|source| TransitionError::StatusLookup {
                    id: id.clone(),
                    source,
                })?;

            match current {
                Some(complaint) => self.advance_from(id, complaint.status).await.map(Some),
                None => {
                    info!(complaint_id = %id, "No complaint to advance");
                    Ok(None)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Advance from a status the caller already holds. No read-back.
    pub async fn advance_from(
        &self,
        id: &ComplaintId,
        current: ComplaintStatus,
    ) -> Result<Advance, TransitionError> {
        let timer = OperationTimer::new("advance_status");
        let next = next_status(current);

        let affected = self
            .store
            .update_status(id, next)
            .await
            .map_err(|source| TransitionError::MutationFailure {
                id: id.clone(),
                target: next,
                source,
            })?;

        info!(complaint_id = %id, from = %current, to = %next, affected, "Advanced complaint status");
        timer.finish();

        Ok(Advance {
            id: id.clone(),
            from: current,
            to: next,
            affected,
        })
    }

    /// Set an explicit status, wait, then read the record back.
    ///
    /// Only a failed write is an error. A failed or empty read-back is logged
    /// and reported as [`SetStatusOutcome::Unconfirmed`].
    pub async fn set_status(
        &self,
        id: &ComplaintId,
        target: ComplaintStatus,
    ) -> Result<SetStatusOutcome, TransitionError> {
        let correlation_id = generate_correlation_id();
        let span = create_transition_span("set_status", id, Some(target), &correlation_id);

        async {
            let timer = OperationTimer::new("set_status");

            let affected = self
                .store
                .update_status(id, target)
                .await
                .map_err(|source| TransitionError::MutationFailure {
                    id: id.clone(),
                    target,
                    source,
                })?;

            tokio::time::sleep(self.readback_delay).await;

            let outcome = match self.store.read_by_id(id).await {
                Ok(Some(complaint)) => {
                    info!(complaint_id = %id, status = %complaint.status, affected, "Status change confirmed");
                    SetStatusOutcome::Confirmed { complaint, affected }
                }
                Ok(None) => {
                    warn!(complaint_id = %id, target = %target, affected, "Complaint not found on read-back");
                    SetStatusOutcome::Unconfirmed {
                        id: id.clone(),
                        target,
                        affected,
                        failure: ReadbackFailure::NotFound,
                    }
                }
                Err(e) => {
                    warn!(complaint_id = %id, target = %target, error = %e, "Read-back after status change failed");
                    SetStatusOutcome::Unconfirmed {
                        id: id.clone(),
                        target,
                        affected,
                        failure: ReadbackFailure::Store(e),
                    }
                }
            };

            timer.finish();
            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}
