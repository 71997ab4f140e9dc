/// SQLite persistence for users and usage logs

use crate::account::{plan::Plan, types::{UsageAction, User}};
use crate::database::now_timestamp;
use anyhow::Result;
use serde_json::Value;
use sqlx::{sqlite::SqlitePool, Row};

#[derive(Debug, Clone)]
pub struct AccountStorage {
    pool: SqlitePool,
}

/// One usage log row
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub workflow_id: Option<String>,
    pub metadata: Value,
    pub created_at: String,
}

impl AccountStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the user or update plan/name/email of an existing one
    pub async fn upsert_user(
        &self,
        id: &str,
        plan: Plan,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, plan, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = COALESCE(excluded.name, users.name),
                email = COALESCE(excluded.email, users.email),
                plan = excluded.plan
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(plan.as_str())
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.get_user(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User '{}' vanished after upsert", id))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, plan, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let plan: String = row.get("plan");
                Ok(Some(User {
                    id: row.get("id"),
                    name: row.get("name"),
                    email: row.get("email"),
                    plan: plan.parse()?,
                    created_at: row.get("created_at"),
                }))
            }
            None => Ok(None),
        }
    }

    /// Append a usage log entry
    pub async fn log_usage(
        &self,
        user_id: &str,
        action: UsageAction,
        workflow_id: Option<&str>,
        metadata: &Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO usage_logs (id, user_id, action, workflow_id, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(action.as_str())
        .bind(workflow_id)
        .bind(serde_json::to_string(metadata)?)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The user's usage log, newest first
    pub async fn usage_for_user(&self, user_id: &str) -> Result<Vec<UsageEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, action, workflow_id, metadata, created_at
            FROM usage_logs WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let metadata_json: String = row.get("metadata");
            entries.push(UsageEntry {
                id: row.get("id"),
                user_id: row.get("user_id"),
                action: row.get("action"),
                workflow_id: row.get("workflow_id"),
                metadata: serde_json::from_str(&metadata_json)?,
                created_at: row.get("created_at"),
            });
        }

        Ok(entries)
    }
}
