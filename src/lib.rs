// complaint-tracker library - complaint records, the status transition engine
// and the sessions that drive them. Exposed for the CLI and for integration tests.

pub mod cli;
pub mod complaints;
pub mod config;
pub mod http;
pub mod observability;
pub mod priority;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use complaints::{
    Complaint, ComplaintId, ComplaintStatus, ComplaintView, NewComplaint, StatusFilter,
    StatusHistoryEntry, SubmissionError, SubmissionForm, STATUS_CYCLE,
};
pub use config::{config, ComplaintTrackerConfig};
pub use http::RateLimitedHttpClient;
pub use observability::{store_metrics, OperationTimer, StoreApiMetrics};
pub use priority::Priority;
pub use session::{Role, Session, SessionError};
pub use store::{ComplaintQuery, ComplaintStore, InMemoryComplaintStore, StoreError};
pub use telemetry::{generate_correlation_id, init_telemetry};
pub use workflow::{
    Advance, ReadbackFailure, SetStatusOutcome, TransitionEngine, TransitionError,
};
