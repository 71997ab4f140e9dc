/// Workflow generation and retrieval endpoints
///
/// Generation runs the whole pipeline for one request: quota check, model call,
/// structural validation, persistence, and usage logging. Every attempt is logged,
/// including failures.

use crate::{
    account::{storage::AccountStorage, types::UsageAction},
    api::response::{ApiError, ApiResponse, CurrentUser},
    generation::{GenerationError, GenerationRequest, WorkflowGenerator},
    template::TemplateRegistry,
    workflow::{
        storage::{StoredWorkflow, WorkflowStorage, WorkflowSummary},
        types::{download_file_name, unicode_download_file_name, WorkflowDocument},
        validator::{self, ValidationIssue},
    },
};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const QUOTA_MESSAGE: &str = "Monthly workflow limit reached. Please upgrade your plan.";

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Generated workflow persistence
    pub workflows: WorkflowStorage,
    /// Users, plans, and usage logs
    pub accounts: AccountStorage,
    /// Template catalog snapshot
    pub templates: Arc<TemplateRegistry>,
    /// Model-backed workflow generator
    pub generator: Arc<WorkflowGenerator>,
}

/// Successful generation payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub workflow: StoredWorkflow,
    pub n8n_json: WorkflowDocument,
    /// Milliseconds spent generating and validating
    pub generation_time: u64,
}

/// Create workflow routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows/generate", post(generate_workflow))
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflows/{id}", get(get_workflow))
        .route("/api/workflows/{id}/download", get(download_workflow))
}

/// Generate, validate, and store a new workflow
///
/// POST /api/workflows/generate
/// Body: { "description": "...", "complexity"?: "simple|medium|complex", "category"?: "...", "requirements"?: [...] }
async fn generate_workflow(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: String,
) -> Result<Json<ApiResponse<GenerationResponse>>, ApiError> {
    // Parse manually so malformed bodies get the uniform envelope
    let request: GenerationRequest = serde_json::from_str(&body).map_err(|e| {
        tracing::warn!("❌ Invalid generation request body from {}: {}", user_id, e);
        ApiError::BadRequest(format!("Invalid request body: {}", e))
    })?;

    if request.trimmed_description().is_empty() {
        return Err(ApiError::BadRequest("Workflow description is required".to_string()));
    }

    let user = state
        .accounts
        .get_user(&user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to load user", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let limits = user.plan.limits();
    let used = state
        .workflows
        .count_this_month(&user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to count monthly workflows", e))?;
    if !limits.allows_another(used) {
        tracing::info!("🚫 Monthly limit reached for {} ({} plan, {} used)", user.id, user.plan, used);
        return Err(ApiError::Forbidden(QUOTA_MESSAGE.to_string()));
    }

    let start_time = std::time::Instant::now();

    let document = match generate_validated(&state.generator, &request).await {
        Ok(document) => document,
        Err(failure) => {
            let elapsed = start_time.elapsed().as_millis() as u64;
            tracing::error!("❌ Workflow generation failed for {} after {}ms: {}", user.id, elapsed, failure);

            let metadata = json!({
                "error": failure.to_string(),
                "errorKind": failure.kind(),
                "generationTime": elapsed,
                "complexity": request.complexity,
                "category": &request.category,
            });
            if let Err(e) = state
                .accounts
                .log_usage(&user.id, UsageAction::WorkflowGenerated, None, &metadata)
                .await
            {
                tracing::error!("❌ Failed to record failed generation: {}", e);
            }

            return Err(failure.into());
        }
    };

    // The insert re-checks the limit; overlapping requests can all pass the count above
    let saved = state
        .workflows
        .save_within_limit(
            &user.id,
            request.trimmed_description(),
            &document,
            limits.workflows_per_month,
        )
        .await
        .map_err(|e| ApiError::internal("Failed to save workflow", e))?
        .ok_or_else(|| {
            tracing::info!("🚫 Monthly limit reached for {} while saving ({} plan)", user.id, user.plan);
            ApiError::Forbidden(QUOTA_MESSAGE.to_string())
        })?;

    let generation_time = start_time.elapsed().as_millis() as u64;
    let metadata = json!({
        "generationTime": generation_time,
        "nodeCount": document.node_count(),
        "complexity": request.complexity,
        "category": &request.category,
    });
    if let Err(e) = state
        .accounts
        .log_usage(&user.id, UsageAction::WorkflowGenerated, Some(&saved.id), &metadata)
        .await
    {
        tracing::error!("❌ Failed to record generation of {}: {}", saved.id, e);
    }

    tracing::info!(
        "🎉 Generated workflow {} ('{}', {} nodes) for {} in {}ms",
        saved.id,
        saved.title,
        saved.node_count,
        user.id,
        generation_time
    );

    Ok(ApiResponse::ok(GenerationResponse {
        workflow: saved,
        n8n_json: document,
        generation_time,
    }))
}

/// Why one generation attempt produced nothing to store
#[derive(Debug)]
enum AttemptFailure {
    Generation(GenerationError),
    /// The model produced a document n8n would not import
    Invalid(ValidationIssue),
}

impl AttemptFailure {
    fn kind(&self) -> &'static str {
        match self {
            Self::Generation(err) => err.kind(),
            Self::Invalid(_) => "validation_failed",
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation(err) => write!(f, "{}", err),
            Self::Invalid(issue) => write!(f, "Generated workflow failed validation: {}", issue),
        }
    }
}

impl From<AttemptFailure> for ApiError {
    fn from(failure: AttemptFailure) -> Self {
        match failure {
            AttemptFailure::Generation(err) => err.into(),
            AttemptFailure::Invalid(_) => ApiError::GenerationRejected,
        }
    }
}

/// Run the generator and reject documents that fail structural validation
async fn generate_validated(
    generator: &WorkflowGenerator,
    request: &GenerationRequest,
) -> Result<WorkflowDocument, AttemptFailure> {
    let document = generator
        .generate(request)
        .await
        .map_err(AttemptFailure::Generation)?;
    validator::check_document(&document).map_err(AttemptFailure::Invalid)?;
    Ok(document)
}

/// List the caller's workflows, newest first
///
/// GET /api/workflows
async fn list_workflows(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let workflows: Vec<WorkflowSummary> = state
        .workflows
        .list_for_user(&user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to list workflows", e))?;

    Ok(ApiResponse::ok(json!({ "workflows": workflows })))
}

/// Get one stored workflow
///
/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StoredWorkflow>>, ApiError> {
    let workflow = load_owned(&state, &user_id, &id).await?;
    Ok(ApiResponse::ok(workflow))
}

/// Download the n8n JSON as an attachment
///
/// GET /api/workflows/{id}/download
async fn download_workflow(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let workflow = load_owned(&state, &user_id, &id).await?;

    let body = serde_json::to_string_pretty(&workflow.n8n_json)
        .map_err(|e| ApiError::internal("Failed to serialize workflow", e))?;

    if let Err(e) = state
        .accounts
        .log_usage(&user_id, UsageAction::WorkflowExported, Some(&workflow.id), &json!({}))
        .await
    {
        tracing::error!("❌ Failed to record workflow export: {}", e);
    }

    Ok(attachment(&workflow.title, body))
}

async fn load_owned(state: &AppState, user_id: &str, id: &str) -> Result<StoredWorkflow, ApiError> {
    state
        .workflows
        .get_for_user(user_id, id)
        .await
        .map_err(|e| ApiError::internal("Failed to load workflow", e))?
        .ok_or_else(|| ApiError::NotFound("Workflow not found".to_string()))
}

/// RFC 5987 `attr-char`: everything else in `filename*` is percent-encoded
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `Content-Disposition` for a download named after `title`
///
/// `filename` carries the ASCII name for old clients, `filename*` the UTF-8 one.
pub(crate) fn content_disposition(title: &str) -> String {
    let unicode_name = unicode_download_file_name(title);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        download_file_name(title),
        utf8_percent_encode(&unicode_name, ATTR_CHAR)
    )
}

/// JSON file response downloaded under a name derived from `title`
pub(crate) fn attachment(title: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(title)),
        ],
        body,
    )
        .into_response()
}
