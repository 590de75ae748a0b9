use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::complaints::Complaint;
use crate::config::{ComplaintTrackerConfig, StoreBackend};
use crate::http::RateLimitedHttpClient;
use crate::session::{Session, SessionError};
use crate::store::{
    AuthClient, ComplaintStore, ImageStorage, StoreError, SupabaseComplaintStore,
};
use crate::workflow::{TransitionEngine, TransitionError};

pub mod account;
pub mod list;
pub mod show;
pub mod status;
pub mod submit;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Everything a command needs, built from configuration on demand
pub struct AppContext {
    pub config: ComplaintTrackerConfig,
}

impl AppContext {
    pub fn new(config: ComplaintTrackerConfig) -> Self {
        Self { config }
    }

    /// Context from the global layered configuration
    pub fn load() -> Result<Self> {
        Ok(Self::new(crate::config::config()?.clone()))
    }

    fn http(&self, access_token: Option<String>) -> Result<RateLimitedHttpClient, StoreError> {
        let store = &self.config.store;
        let url = store.url.as_deref().unwrap_or_default();
        let anon_key = store.anon_key.as_deref().unwrap_or_default();

        Ok(RateLimitedHttpClient::new(
            url,
            anon_key,
            &store.rate_limit,
            Duration::from_secs(store.cache_ttl_seconds),
        )?
        .with_access_token(access_token))
    }

    pub fn auth(&self, session: Option<&Session>) -> Result<AuthClient, StoreError> {
        let token = session.map(|s| s.access_token.clone());
        Ok(AuthClient::new(self.http(token)?))
    }

    pub async fn store(&self, session: &Session) -> Result<Arc<dyn ComplaintStore>, StoreError> {
        match self.config.store.backend {
            StoreBackend::Supabase => {
                let http = self.http(Some(session.access_token.clone()))?;
                Ok(Arc::new(SupabaseComplaintStore::new(http, &self.config.store)))
            }
            StoreBackend::Sqlite => self.sqlite_store().await,
        }
    }

    #[cfg(feature = "database")]
    async fn sqlite_store(&self) -> Result<Arc<dyn ComplaintStore>, StoreError> {
        let database = self.config.database.as_ref().ok_or_else(|| {
            StoreError::Config("store.backend is sqlite but [database] is missing".to_string())
        })?;
        Ok(Arc::new(
            crate::store::SqliteComplaintStore::connect(database).await?,
        ))
    }

    #[cfg(not(feature = "database"))]
    async fn sqlite_store(&self) -> Result<Arc<dyn ComplaintStore>, StoreError> {
        Err(StoreError::Config(
            "store.backend is sqlite but this build lacks the `database` feature".to_string(),
        ))
    }

    /// Evidence uploads only exist on the hosted backend
    pub fn images(&self, session: &Session) -> Result<Option<ImageStorage>, StoreError> {
        match self.config.store.backend {
            StoreBackend::Supabase => {
                let http = self.http(Some(session.access_token.clone()))?;
                Ok(Some(ImageStorage::new(http, self.config.store.image_bucket.clone())))
            }
            StoreBackend::Sqlite => Ok(None),
        }
    }

    pub async fn engine(&self, session: &Session) -> Result<TransitionEngine, StoreError> {
        Ok(TransitionEngine::from_config(
            self.store(session).await?,
            &self.config.workflow,
        ))
    }

    pub async fn session(&self) -> Result<Session> {
        match Session::load_active(&self.config.session.file, Utc::now()).await {
            Ok(session) => Ok(session),
            Err(e) => {
                report_session_error(&e);
                Err(e.into())
            }
        }
    }
}

pub fn report_session_error(error: &SessionError) {
    println!("❌ {error}");
    match error {
        SessionError::NotSignedIn | SessionError::Expired(_) => {
            println!("   💡 Run 'complaint-tracker login --email you@example.com'");
        }
        SessionError::AdminRequired { .. } => {
            println!("   💡 Sign in with an administrator account");
        }
        SessionError::Io(_) | SessionError::Corrupt(_) => {
            println!("   💡 Run 'complaint-tracker logout' and sign in again");
        }
    }
}

pub fn report_store_error(context: &str, error: &StoreError) {
    println!("❌ {context}: {error}");
    let hints = error.troubleshooting();
    if !hints.is_empty() {
        println!();
        println!("🎯 TROUBLESHOOTING:");
        for hint in hints {
            println!("   → {hint}");
        }
    }
}

pub fn report_transition_error(error: &TransitionError) {
    let context = match error {
        TransitionError::MutationFailure { id, target, .. } => {
            format!("Could not set complaint #{id} to {target}")
        }
        TransitionError::StatusLookup { id, .. } => {
            format!("Could not read complaint #{id}")
        }
    };
    report_store_error(&context, error.store_error());
}

/// One-line listing entry
pub fn print_complaint_line(complaint: &Complaint) {
    println!(
        "   {} #{} {} [{} · {} {}]{}",
        complaint.status.emoji(),
        complaint.id,
        complaint.title,
        complaint.category,
        complaint.priority.emoji(),
        complaint.priority,
        if complaint.has_evidence() { " 📎" } else { "" }
    );
}

pub async fn show_getting_started() -> Result<()> {
    println!("📣 complaint-tracker - File complaints and track them to resolution");
    println!();
    println!("To get started:");
    println!("  🔑 complaint-tracker login --email you@example.com   # Sign in");
    println!("  📝 complaint-tracker submit --title ... --description ...");
    println!("  📋 complaint-tracker list                            # Your complaints");
    println!("  🔍 complaint-tracker show <id>                       # Details and timeline");
    println!();
    println!("Admin commands:");
    println!("  🗂️  complaint-tracker admin                           # All complaints with stats");
    println!("  ⏭️  complaint-tracker advance <id>                    # Next status in the cycle");
    println!("  🎯 complaint-tracker set-status <id> RESOLVED");
    println!();
    println!("💡 New here? Create an account with 'complaint-tracker signup'");
    Ok(())
}
