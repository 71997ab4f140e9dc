/// SQLite persistence layer for generated workflows
///
/// Each row is one generation result owned by one user. The n8n document is kept
/// as JSON text exactly as it will be downloaded.

use crate::database::{now_timestamp, timestamp};
use crate::workflow::types::WorkflowDocument;
use anyhow::Result;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqlitePool, Row};

/// Generated workflow storage
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    pool: SqlitePool,
}

/// A persisted generation result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkflow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub n8n_json: WorkflowDocument,
    pub node_count: i64,
    pub created_at: String,
}

/// Listing row without the document body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub node_count: i64,
    pub created_at: String,
}

impl WorkflowStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a freshly generated document for `user_id`
    ///
    /// The record id is independent of the document's own `id` field.
    pub async fn save_generated(
        &self,
        user_id: &str,
        description: &str,
        document: &WorkflowDocument,
    ) -> Result<StoredWorkflow> {
        self.save_within_limit(user_id, description, document, None)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Unlimited save was rejected"))
    }

    /// Persist a document unless `user_id` already stored `monthly_limit` this month
    ///
    /// Count and insert run as one statement, so concurrent saves for the same
    /// user cannot overshoot the limit. `Ok(None)` means the limit was reached.
    pub async fn save_within_limit(
        &self,
        user_id: &str,
        description: &str,
        document: &WorkflowDocument,
        monthly_limit: Option<u32>,
    ) -> Result<Option<StoredWorkflow>> {
        let record = StoredWorkflow {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: document.name().unwrap_or("Untitled Workflow").to_string(),
            description: description.to_string(),
            n8n_json: document.clone(),
            node_count: document.node_count() as i64,
            created_at: now_timestamp(),
        };
        let definition_json = serde_json::to_string(document)?;
        let limit = monthly_limit.map(i64::from);

        let result = sqlx::query(
            r#"
            INSERT INTO workflows (id, user_id, title, description, definition, node_count, created_at)
            SELECT ?, ?, ?, ?, ?, ?, ?
            WHERE ? IS NULL
               OR (SELECT COUNT(*) FROM workflows WHERE user_id = ? AND created_at >= ?) < ?
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&definition_json)
        .bind(record.node_count)
        .bind(&record.created_at)
        .bind(limit)
        .bind(&record.user_id)
        .bind(timestamp(month_start(Utc::now())))
        .bind(limit)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Fetch one workflow, only if it belongs to `user_id`
    pub async fn get_for_user(&self, user_id: &str, id: &str) -> Result<Option<StoredWorkflow>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, description, definition, node_count, created_at
            FROM workflows WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let definition_json: String = row.get("definition");
                Ok(Some(StoredWorkflow {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    title: row.get("title"),
                    description: row.get("description"),
                    n8n_json: serde_json::from_str(&definition_json)?,
                    node_count: row.get("node_count"),
                    created_at: row.get("created_at"),
                }))
            }
            None => Ok(None),
        }
    }

    /// The user's workflows, newest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkflowSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, node_count, created_at
            FROM workflows WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| WorkflowSummary {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                node_count: row.get("node_count"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Workflows the user created since the start of the current UTC month
    pub async fn count_this_month(&self, user_id: &str) -> Result<i64> {
        self.count_since(user_id, month_start(Utc::now())).await
    }

    pub async fn count_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workflows WHERE user_id = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(timestamp(since))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Midnight UTC on the first day of `now`'s month
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
