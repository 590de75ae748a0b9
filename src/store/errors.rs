use thiserror::Error;

/// Failures talking to the complaint record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error talking to the record store: {0}")]
    Http(#[from] reqwest::Error),

    #[error("record store rejected the request (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not decode record store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record store is not configured: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "database")]
    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        StoreError::Api {
            status,
            message: message.into(),
        }
    }

    /// Row-level security or an expired token
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::Api { status: 401 | 403, .. })
    }

    /// Operator-facing hints printed by the CLI under the error message
    pub fn troubleshooting(&self) -> Vec<&'static str> {
        match self {
            StoreError::Http(_) => vec![
                "Check connectivity: curl -I $SUPABASE_URL/rest/v1/",
                "Verify store.url in complaint-tracker.toml or SUPABASE_URL",
            ],
            StoreError::Api { status: 401, .. } => vec![
                "Session expired or token invalid",
                "Run: complaint-tracker login --email you@example.com",
            ],
            StoreError::Api { status: 403, .. } => vec![
                "Row-level security denied the request",
                "Admin-only actions need an account with role=admin",
            ],
            StoreError::Api { status: 404, .. } => vec![
                "Table or bucket not found",
                "Check store.complaints_table, store.history_table and store.image_bucket",
            ],
            StoreError::Api { .. } => vec![
                "Inspect the message above for the column or constraint involved",
            ],
            StoreError::Decode(_) => vec![
                "The table schema does not match the expected complaint columns",
                "Status must be one of OPEN, IN_PROGRESS, RESOLVED",
            ],
            StoreError::Config(_) => vec![
                "Set SUPABASE_URL and SUPABASE_ANON_KEY (or put them in .env)",
                "Or configure [store] in complaint-tracker.toml",
            ],
            StoreError::Io(_) => vec![
                "Check file permissions and that the path exists",
            ],
            #[cfg(feature = "database")]
            StoreError::Database(_) | StoreError::Migration(_) => vec![
                "Check database.url and that the directory is writable",
            ],
        }
    }
}
