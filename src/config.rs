use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for complaint-tracker
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComplaintTrackerConfig {
    /// Record store connection
    pub store: StoreConfig,
    /// Status transition settings
    pub workflow: WorkflowConfig,
    /// Session handling
    pub session: SessionConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Local SQLite store (only used with the `database` feature)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Supabase,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Project URL, e.g. https://xyz.supabase.co (SUPABASE_URL also works)
    pub url: Option<String>,
    /// Public anon key (SUPABASE_ANON_KEY also works)
    pub anon_key: Option<String>,
    pub complaints_table: String,
    pub history_table: String,
    pub image_bucket: String,
    /// How long GET responses may be served from the local cache
    pub cache_ttl_seconds: u64,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Wait between a status write and its confirmatory read
    pub readback_delay_ms: u64,
}

impl WorkflowConfig {
    pub fn readback_delay(&self) -> Duration {
        Duration::from_millis(self.readback_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Where the signed-in session is kept between invocations
    pub file: PathBuf,
    /// Accounts treated as administrators regardless of their metadata
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (overridden by RUST_LOG)
    pub log_level: String,
    /// Emit JSON log lines instead of compact text
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for ComplaintTrackerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Supabase,
                url: None,
                anon_key: None,
                complaints_table: "complaints".to_string(),
                history_table: "complaint_status_history".to_string(),
                image_bucket: "complaint-images".to_string(),
                cache_ttl_seconds: 30,
                rate_limit: RateLimitConfig {
                    requests_per_second: 10,
                    burst_capacity: 20,
                },
            },
            workflow: WorkflowConfig {
                readback_delay_ms: 300,
            },
            session: SessionConfig {
                file: PathBuf::from(".complaint-tracker/session.json"),
                admin_emails: Vec::new(),
            },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                json_logs: false,
            },
            database: Some(DatabaseConfig {
                url: "sqlite://.complaint-tracker/complaints.db".to_string(),
                max_connections: 5,
                auto_migrate: true,
            }),
        }
    }
}

impl ComplaintTrackerConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (complaint-tracker.toml, .complaint-tracker-rc)
    /// 3. Environment variables (prefixed with COMPLAINT_TRACKER__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`load`](Self::load) with config files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let toml_path = dir.join("complaint-tracker.toml");
        if toml_path.exists() {
            builder = builder.add_source(File::from(toml_path));
        }

        let rc_path = dir.join(".complaint-tracker-rc");
        if rc_path.exists() {
            builder = builder.add_source(File::from(rc_path).format(config::FileFormat::Toml));
        }

        // Double underscore so field names keep their single underscores
        builder = builder.add_source(
            Environment::with_prefix("COMPLAINT_TRACKER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut tracker_config: ComplaintTrackerConfig = config.try_deserialize()?;

        // Special handling for the hosted project credentials
        if tracker_config.store.url.is_none() {
            tracker_config.store.url = std::env::var("SUPABASE_URL").ok();
        }
        if tracker_config.store.anon_key.is_none() {
            tracker_config.store.anon_key = std::env::var("SUPABASE_ANON_KEY").ok();
        }

        Ok(tracker_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<ComplaintTrackerConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = ComplaintTrackerConfig::load_env_file();
        ComplaintTrackerConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static ComplaintTrackerConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
