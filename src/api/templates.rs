/// Template catalog endpoints

use crate::{
    account::types::UsageAction,
    api::{
        response::{ApiError, ApiResponse, CurrentUser},
        workflows::{attachment, AppState},
    },
    template::{Template, TemplateCategory},
};
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

/// Query string of the catalog listing
#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    pub search: Option<String>,
    /// Category slug, or "all"
    pub category: Option<String>,
}

pub fn create_template_routes() -> Router<AppState> {
    Router::new()
        .route("/api/templates", get(list_templates))
        .route("/api/templates/{id}/download", get(download_template))
}

/// Search the catalog
///
/// GET /api/templates?search=slack&category=development
async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(slug) => Some(
            slug.parse::<TemplateCategory>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        ),
    };

    let templates: Vec<Template> = state.templates.search(query.search.as_deref(), category);
    tracing::debug!("🔍 Template search matched {} templates", templates.len());

    Ok(ApiResponse::ok(json!({ "templates": templates })))
}

/// Download a template skeleton as n8n JSON
///
/// GET /api/templates/{id}/download
async fn download_template(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let template = state
        .templates
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    if template.is_premium {
        let user = state
            .accounts
            .get_user(&user_id)
            .await
            .map_err(|e| ApiError::internal("Failed to load user", e))?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        if !user.plan.limits().templates_access {
            return Err(ApiError::Forbidden(
                "Premium templates require a plan with template access. Please upgrade your plan."
                    .to_string(),
            ));
        }
    }

    let document = template
        .skeleton()
        .map_err(|e| ApiError::internal("Failed to build template workflow", e))?;
    let body = serde_json::to_string_pretty(&document)
        .map_err(|e| ApiError::internal("Failed to serialize template workflow", e))?;

    if let Err(e) = state.templates.record_use(&template.id).await {
        tracing::error!("❌ Failed to bump usage count of template {}: {}", template.id, e);
    }
    if let Err(e) = state
        .accounts
        .log_usage(&user_id, UsageAction::TemplateUsed, None, &json!({ "templateId": &template.id }))
        .await
    {
        tracing::error!("❌ Failed to record template use: {}", e);
    }

    tracing::info!("📦 Template {} downloaded by {}", template.id, user_id);

    Ok(attachment(&template.title, body))
}
