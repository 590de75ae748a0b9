use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ComplaintQuery, ComplaintStore, StoreError};
use crate::complaints::{
    Complaint, ComplaintId, ComplaintStatus, NewComplaint, StatusHistoryEntry,
};
use crate::config::StoreConfig;
use crate::http::RateLimitedHttpClient;

/// Record store backed by the hosted project's REST interface
#[derive(Debug)]
pub struct SupabaseComplaintStore {
    http: RateLimitedHttpClient,
    complaints_table: String,
    history_table: String,
}

impl SupabaseComplaintStore {
    pub fn new(http: RateLimitedHttpClient, config: &StoreConfig) -> Self {
        Self {
            http,
            complaints_table: config.complaints_table.clone(),
            history_table: config.history_table.clone(),
        }
    }

    fn rows_path<'a>(table: &'a str) -> [&'a str; 3] {
        ["rest", "v1", table]
    }

    fn list_params(&self, query: &ComplaintQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("select", "*".to_string())];
        if let Some(owner) = &query.owner {
            params.push(("user_id", format!("eq.{owner}")));
        }
        if let Some(status) = query.status {
            params.push(("status", format!("eq.{}", status.as_str())));
        }
        if let Some(needle) = &query.title_contains {
            params.push(("title", format!("ilike.{}", contains_pattern(needle))));
        }
        params.push(("order", "created_at.desc".to_string()));
        params
    }
}

/// `ilike` operand matching `needle` anywhere in the column.
///
/// LIKE metacharacters in the needle are escaped. PostgREST rewrites every
/// `*` to `%`, so a literal `*` can only be matched as the one-character
/// wildcard `_`.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('*');
    for c in needle.chars() {
        match c {
            '\\' | '%' | '_' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '*' => pattern.push('_'),
            _ => pattern.push(c),
        }
    }
    pattern.push('*');
    pattern
}

fn cache_key(prefix: &str, params: &[(&str, String)]) -> String {
    let pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{prefix}:{}", pairs.join("&"))
}

fn rows<T: serde::de::DeserializeOwned>(value: Value) -> Result<Vec<T>, StoreError> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other)?),
    }
}

#[async_trait]
impl ComplaintStore for SupabaseComplaintStore {
    async fn update_status(
        &self,
        id: &ComplaintId,
        status: ComplaintStatus,
    ) -> Result<u64, StoreError> {
        // return=representation hands back the updated rows, so the count is
        // exact even when row-level security filters the write to nothing
        let value = self
            .http
            .send_json(
                Method::PATCH,
                &Self::rows_path(&self.complaints_table),
                &[("id", format!("eq.{id}"))],
                &json!({ "status": status }),
                Some("return=representation"),
            )
            .await?;

        let updated: Vec<Value> = rows(value)?;

        self.http.invalidate_cache_pattern("list:").await;

        info!(complaint_id = %id, status = %status, affected = updated.len(), "Status updated");
        Ok(updated.len() as u64)
    }

    /// Never cached: this is the read that confirms a status write
    async fn read_by_id(&self, id: &ComplaintId) -> Result<Option<Complaint>, StoreError> {
        let value = self
            .http
            .get_json(
                &Self::rows_path(&self.complaints_table),
                &[("select", "*".to_string()), ("id", format!("eq.{id}"))],
                None,
            )
            .await?;
        let mut complaints: Vec<Complaint> = rows(value)?;
        debug!(complaint_id = %id, found = !complaints.is_empty(), "Read complaint");

        Ok(if complaints.is_empty() {
            None
        } else {
            Some(complaints.swap_remove(0))
        })
    }

    async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>, StoreError> {
        let params = self.list_params(query);
        let value = self
            .http
            .get_json(
                &Self::rows_path(&self.complaints_table),
                &params,
                Some(cache_key("list", &params)),
            )
            .await?;
        rows(value)
    }

    async fn insert(&self, complaint: &NewComplaint) -> Result<Complaint, StoreError> {
        let value = self
            .http
            .send_json(
                Method::POST,
                &Self::rows_path(&self.complaints_table),
                &[],
                &serde_json::to_value(complaint)?,
                Some("return=representation"),
            )
            .await?;

        self.http.invalidate_cache_pattern("list:").await;

        let mut inserted: Vec<Complaint> = rows(value)?;
        if inserted.is_empty() {
            return Err(StoreError::api(
                200,
                "insert succeeded but the store returned no row (check the select policy)",
            ));
        }
        let complaint = inserted.swap_remove(0);
        info!(complaint_id = %complaint.id, "Complaint created");
        Ok(complaint)
    }

    async fn status_history(
        &self,
        id: &ComplaintId,
    ) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        let params = [
            ("select", "*".to_string()),
            ("complaint_id", format!("eq.{id}")),
            ("order", "changed_at.asc".to_string()),
        ];
        let value = self
            .http
            .get_json(&Self::rows_path(&self.history_table), &params, None)
            .await?;
        rows(value)
    }
}
