/// SQLite persistence for the template catalog

use crate::database::now_timestamp;
use crate::template::types::{Template, TemplateCategory};
use anyhow::Result;
use sqlx::{sqlite::SqlitePool, Row};

#[derive(Debug, Clone)]
pub struct TemplateStorage {
    pool: SqlitePool,
}

impl TemplateStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the starter catalog when the table is empty
    ///
    /// Returns the number of templates inserted.
    pub async fn seed_defaults(&self) -> Result<usize> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM templates")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(0);
        }

        let starters = starter_templates();
        for template in &starters {
            self.save_template(template).await?;
        }
        tracing::info!("🌱 Seeded {} starter templates", starters.len());
        Ok(starters.len())
    }

    /// Insert or replace a template
    pub async fn save_template(&self, template: &Template) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO templates (id, title, description, category, is_premium, usage_count, node_count, tags, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                is_premium = excluded.is_premium,
                usage_count = excluded.usage_count,
                node_count = excluded.node_count,
                tags = excluded.tags
            "#,
        )
        .bind(&template.id)
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.category.as_str())
        .bind(template.is_premium)
        .bind(template.usage_count)
        .bind(i64::from(template.node_count))
        .bind(serde_json::to_string(&template.tags)?)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Every template, most used first
    pub async fn load_all(&self) -> Result<Vec<Template>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, category, is_premium, usage_count, node_count, tags
            FROM templates ORDER BY usage_count DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut templates = Vec::with_capacity(rows.len());
        for row in rows {
            let category: String = row.get("category");
            let tags_json: String = row.get("tags");
            let node_count: i64 = row.get("node_count");
            templates.push(Template {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                category: category.parse::<TemplateCategory>()?,
                is_premium: row.get("is_premium"),
                usage_count: row.get("usage_count"),
                node_count: u32::try_from(node_count)?,
                tags: serde_json::from_str(&tags_json)?,
            });
        }

        Ok(templates)
    }

    /// Bump the usage counter; false when no such template
    pub async fn increment_usage(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE templates SET usage_count = usage_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn starter_templates() -> Vec<Template> {
    let starter = |id: &str,
                   title: &str,
                   description: &str,
                   category: TemplateCategory,
                   is_premium: bool,
                   usage_count: i64,
                   node_count: u32,
                   tags: &[&str]| Template {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        is_premium,
        usage_count,
        node_count,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    };

    vec![
        starter(
            "1",
            "Slack Notification for GitHub Issues",
            "Automatically send Slack notifications when new GitHub issues are created or updated",
            TemplateCategory::Development,
            false,
            245,
            4,
            &["github", "slack", "notifications", "issues"],
        ),
        starter(
            "2",
            "Customer Onboarding Email Sequence",
            "Welcome new customers with a personalized email sequence and create tasks in your CRM",
            TemplateCategory::Marketing,
            true,
            189,
            7,
            &["email", "crm", "onboarding", "automation"],
        ),
        starter(
            "3",
            "E-commerce Order Processing",
            "Process new orders by updating inventory, sending confirmations, and creating shipping labels",
            TemplateCategory::Ecommerce,
            true,
            156,
            9,
            &["orders", "inventory", "shipping", "confirmation"],
        ),
        starter(
            "4",
            "Google Sheets to Airtable Sync",
            "Automatically sync data between Google Sheets and Airtable when rows are added or updated",
            TemplateCategory::Operations,
            false,
            312,
            5,
            &["google-sheets", "airtable", "sync", "data"],
        ),
        starter(
            "5",
            "Social Media Post Scheduler",
            "Schedule and publish content across multiple social media platforms from a central spreadsheet",
            TemplateCategory::SocialMedia,
            true,
            98,
            8,
            &["social-media", "scheduling", "content", "automation"],
        ),
        starter(
            "6",
            "Invoice Generation and Delivery",
            "Generate professional invoices and automatically send them to customers via email",
            TemplateCategory::Finance,
            false,
            134,
            6,
            &["invoices", "email", "finance", "automation"],
        ),
    ]
}
