use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use tracing::info;

use super::{ComplaintQuery, ComplaintStore, StoreError};
use crate::complaints::{
    Complaint, ComplaintId, ComplaintStatus, NewComplaint, RecordId, StatusHistoryEntry,
};
use crate::config::DatabaseConfig;

/// Local record store for offline use. The migration installs the same
/// status-history trigger the hosted table has.
#[derive(Debug, Clone)]
pub struct SqliteComplaintStore {
    pool: SqlitePool,
}

impl SqliteComplaintStore {
    /// Open (creating if needed) the database and run migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(&config.url).await? {
            info!("Creating database at {}", config.url);
            sqlx::Sqlite::create_database(&config.url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&config.url)
            .await?;

        if config.auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }
}

/// Row ids are integers here; anything else cannot exist
fn row_id(id: &ComplaintId) -> Option<i64> {
    id.as_str().parse().ok()
}

/// Decode a text column through serde so it gets the same validation as the
/// hosted store's JSON
fn decode<T: DeserializeOwned>(text: String) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::String(text))?)
}

fn complaint_from_row(row: &SqliteRow) -> Result<Complaint, StoreError> {
    let created_at: Option<String> = row.try_get("created_at")?;
    Ok(Complaint {
        id: RecordId::from(row.try_get::<i64, _>("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        priority: decode(row.try_get("priority")?)?,
        status: decode(row.try_get("status")?)?,
        image_url: row.try_get("image_url")?,
        user_id: row.try_get("user_id")?,
        user_email: row.try_get("user_email")?,
        created_at: created_at.map(decode::<DateTime<Utc>>).transpose()?,
    })
}

const COMPLAINT_COLUMNS: &str =
    "id, title, description, category, priority, status, image_url, user_id, user_email, created_at";

#[async_trait]
impl ComplaintStore for SqliteComplaintStore {
    async fn update_status(
        &self,
        id: &ComplaintId,
        status: ComplaintStatus,
    ) -> Result<u64, StoreError> {
        let Some(row_id) = row_id(id) else {
            return Ok(0);
        };

        let result = sqlx::query("UPDATE complaints SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(row_id)
            .execute(&self.pool)
            .await?;

        info!(complaint_id = %id, status = %status, affected = result.rows_affected(), "Status updated");
        Ok(result.rows_affected())
    }

    async fn read_by_id(&self, id: &ComplaintId) -> Result<Option<Complaint>, StoreError> {
        let Some(row_id) = row_id(id) else {
            return Ok(None);
        };

        let row = sqlx::query(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = ?1"
        ))
        .bind(row_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(complaint_from_row).transpose()
    }

    async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>, StoreError> {
        let mut sql = format!("SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE 1 = 1");
        if query.owner.is_some() {
            sql.push_str(" AND user_id = ?");
        }
        if query.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if query.title_contains.is_some() {
            sql.push_str(" AND LOWER(title) LIKE '%' || LOWER(?) || '%'");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut statement = sqlx::query(&sql);
        if let Some(owner) = &query.owner {
            statement = statement.bind(owner.as_str());
        }
        if let Some(status) = query.status {
            statement = statement.bind(status.as_str());
        }
        if let Some(needle) = &query.title_contains {
            statement = statement.bind(needle.as_str());
        }

        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter().map(complaint_from_row).collect()
    }

    async fn insert(&self, complaint: &NewComplaint) -> Result<Complaint, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO complaints
                (title, description, category, priority, status, image_url, user_id, user_email)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(complaint.title.as_str())
        .bind(complaint.description.as_str())
        .bind(complaint.category.as_str())
        .bind(complaint.priority.as_str())
        .bind(complaint.status.as_str())
        .bind(complaint.image_url.as_deref())
        .bind(complaint.user_id.as_deref())
        .bind(complaint.user_email.as_deref())
        .execute(&self.pool)
        .await?;

        let id = RecordId::from(result.last_insert_rowid());
        info!(complaint_id = %id, "Complaint created");

        self.read_by_id(&id)
            .await?
            .ok_or_else(|| StoreError::api(500, format!("inserted complaint {id} vanished")))
    }

    async fn status_history(
        &self,
        id: &ComplaintId,
    ) -> Result<Vec<StatusHistoryEntry>, StoreError> {
        let Some(row_id) = row_id(id) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT id, complaint_id, status, changed_at
            FROM complaint_status_history
            WHERE complaint_id = ?1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(row_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<StatusHistoryEntry, StoreError> {
                Ok(StatusHistoryEntry {
                    id: RecordId::from(row.try_get::<i64, _>("id")?),
                    complaint_id: RecordId::from(row.try_get::<i64, _>("complaint_id")?),
                    status: decode(row.try_get("status")?)?,
                    changed_at: decode(row.try_get("changed_at")?)?,
                })
            })
            .collect()
    }
}
