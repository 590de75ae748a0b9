//! Signed-in identity.
//!
//! The role is decided once, when the session is established from the auth
//! service's answer, and then travels with the session. Nothing downstream
//! re-inspects emails or metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::store::auth::{AuthGrant, AuthUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Capability check run at session establishment
    pub fn for_user(user: &AuthUser, admin_emails: &[String]) -> Self {
        let metadata_admin = user
            .user_metadata
            .role
            .as_deref()
            .is_some_and(|role| role.eq_ignore_ascii_case("admin"));

        let listed_admin = user.email.as_deref().is_some_and(|email| {
            admin_emails
                .iter()
                .any(|admin| admin.eq_ignore_ascii_case(email))
        });

        if metadata_admin || listed_admin {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("session expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("this action requires an administrator (signed in as {email})")]
    AdminRequired { email: String },

    #[error("could not read or write the session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn establish(grant: &AuthGrant, admin_emails: &[String], now: DateTime<Utc>) -> Self {
        let role = Role::for_user(&grant.user, admin_emails);
        info!(user_id = %grant.user.id, role = %role, "Session established");

        Self {
            access_token: grant.access_token.clone(),
            user_id: grant.user.id.clone(),
            email: grant.user.email.clone(),
            role,
            expires_at: grant.expires_at(now),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.user_id)
    }

    pub fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.expires_at {
            Some(expires_at) if expires_at <= now => Err(SessionError::Expired(expires_at)),
            _ => Ok(()),
        }
    }

    pub fn require_admin(&self) -> Result<(), SessionError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(SessionError::AdminRequired {
                email: self.display_name().to_string(),
            })
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        debug!(path = %path.display(), "Session saved");
        Ok(())
    }

    /// Load a saved session; `Ok(None)` when nobody is signed in
    pub async fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        match fs::read_to_string(path).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a saved, unexpired session or fail
    pub async fn load_active(path: &Path, now: DateTime<Utc>) -> Result<Self, SessionError> {
        let session = Self::load(path).await?.ok_or(SessionError::NotSignedIn)?;
        session.ensure_fresh(now)?;
        Ok(session)
    }

    pub async fn clear(path: &Path) -> Result<(), SessionError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
