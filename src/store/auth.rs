use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::StoreError;
use crate::http::RateLimitedHttpClient;

/// User record returned by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Free-form metadata written at sign-up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Token grant from a password sign-in
#[derive(Debug, Clone, Deserialize)]
pub struct AuthGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

impl AuthGrant {
    /// `None` when the grant has no lifetime or one too large to represent
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let lifetime = TimeDelta::try_seconds(self.expires_in?)?;
        now.checked_add_signed(lifetime)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// "user" or "admin"
    pub role: String,
}

/// Client for the hosted auth endpoints
#[derive(Debug)]
pub struct AuthClient {
    http: RateLimitedHttpClient,
}

impl AuthClient {
    pub fn new(http: RateLimitedHttpClient) -> Self {
        Self { http }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, StoreError> {
        let body = json!({ "email": email, "password": password });
        let value = self
            .http
            .send_json(
                Method::POST,
                &["auth", "v1", "token"],
                &[("grant_type", "password".to_string())],
                &body,
                None,
            )
            .await?;

        let grant: AuthGrant = serde_json::from_value(value)?;
        info!(user_id = %grant.user.id, "Signed in");
        Ok(grant)
    }

    /// Register an account. Depending on the project's email confirmation
    /// setting the service answers with either a bare user or a full grant.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthUser, StoreError> {
        let body = json!({
            "email": request.email,
            "password": request.password,
            "data": {
                "first_name": request.first_name,
                "last_name": request.last_name,
                "role": request.role,
            }
        });

        let value = self
            .http
            .send_json(Method::POST, &["auth", "v1", "signup"], &[], &body, None)
            .await?;

        let user_value = match value.get("user") {
            Some(user) if !user.is_null() => user.clone(),
            _ => value,
        };
        let user: AuthUser = serde_json::from_value(user_value)?;
        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    /// Revoke the client's access token on the server
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        if !self.http.has_access_token() {
            warn!("sign_out called without an access token");
            return Ok(());
        }
        self.http
            .send_json(Method::POST, &["auth", "v1", "logout"], &[], &Value::Null, None)
            .await?;
        Ok(())
    }
}
