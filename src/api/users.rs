/// User plan and usage endpoints
///
/// Identity itself is owned by the upstream gateway; these routes only record the
/// plan a user is on and report how much of it they have used.

use crate::{
    account::{plan::{Plan, PlanLimits}, storage::UsageEntry, types::User},
    api::{
        response::{ApiError, ApiResponse},
        workflows::AppState,
    },
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};

/// Body of PUT /api/users/{id}
#[derive(Debug, Deserialize)]
pub struct UpsertUserRequest {
    #[serde(default)]
    pub plan: Plan,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub user: User,
    pub limits: PlanLimits,
    pub workflows_this_month: i64,
    /// `None` when the plan is unlimited
    pub remaining_this_month: Option<i64>,
    pub recent_activity: Vec<UsageEntry>,
}

/// Recent usage entries included in the report
const RECENT_ACTIVITY: usize = 20;

pub fn create_user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/{id}", put(upsert_user))
        .route("/api/users/{id}/usage", get(usage_report))
}

/// Create or update a user's plan
///
/// PUT /api/users/{id}
/// Body: { "plan": "pro", "name"?: "...", "email"?: "..." }
async fn upsert_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let request: UpsertUserRequest = serde_json::from_str(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

    let user = state
        .accounts
        .upsert_user(&id, request.plan, request.name.as_deref(), request.email.as_deref())
        .await
        .map_err(|e| ApiError::internal("Failed to save user", e))?;

    tracing::info!("👤 User {} is on the {} plan", user.id, user.plan);
    Ok(ApiResponse::ok_with_message(user, "User saved"))
}

/// Plan limits and current-month consumption
///
/// GET /api/users/{id}/usage
async fn usage_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UsageReport>>, ApiError> {
    let user = state
        .accounts
        .get_user(&id)
        .await
        .map_err(|e| ApiError::internal("Failed to load user", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let used = state
        .workflows
        .count_this_month(&user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to count monthly workflows", e))?;

    let mut recent_activity = state
        .accounts
        .usage_for_user(&user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to load usage log", e))?;
    recent_activity.truncate(RECENT_ACTIVITY);

    let limits = user.plan.limits();
    let remaining_this_month = limits
        .workflows_per_month
        .map(|limit| (i64::from(limit) - used).max(0));

    Ok(ApiResponse::ok(UsageReport {
        user,
        limits,
        workflows_this_month: used,
        remaining_this_month,
        recent_activity,
    }))
}
